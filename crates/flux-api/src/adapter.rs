use async_trait::async_trait;
use serde_json::Value;

use flux_job::{Handle, JobError, SubmitOptions};
use flux_model::{Errno, JobEntry, JobId, JobQuery};

use crate::{error::ApiError, handler::ApiHandler};

/// [`ApiHandler`] that forwards to the coordinator through a connection it owns.
///
/// Every request is made with the connection's credentials, so HTTP callers act as that user.
pub struct GatewayAdapter<H> {
    handle: H,
}

impl<H> GatewayAdapter<H>
where
    H: Handle + 'static,
{
    pub fn new(handle: H) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl<H> ApiHandler for GatewayAdapter<H>
where
    H: Handle + 'static,
{
    async fn submit_job(
        &self,
        jobspec: Option<Value>,
        opts: SubmitOptions,
    ) -> Result<JobId, ApiError> {
        let id = flux_job::submit(Some(&self.handle), jobspec.as_ref(), opts).await?;
        Ok(id)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<JobEntry>, ApiError> {
        match flux_job::lookup_job(&self.handle, id).await {
            Ok(entry) => Ok(Some(entry)),
            Err(JobError::Rpc(e)) if e.errnum() == Errno::ENOENT => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_jobs(&self, query: JobQuery) -> Result<Vec<JobEntry>, ApiError> {
        Ok(flux_job::list_jobs(&self.handle, &query).await?)
    }
}
