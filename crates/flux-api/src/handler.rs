use async_trait::async_trait;
use serde_json::Value;

use flux_job::SubmitOptions;
use flux_model::{JobEntry, JobId, JobQuery};

use crate::error::ApiError;

/// Job API handler.
///
/// Abstracts the backend so transports stay thin:
/// - use the provided [`GatewayAdapter`](crate::GatewayAdapter);
/// - or wrap it with extra logic (auth, rate limiting, etc.).
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Submit an encoded jobspec. `None` is rejected as an invalid argument.
    async fn submit_job(
        &self,
        jobspec: Option<Value>,
        opts: SubmitOptions,
    ) -> Result<JobId, ApiError>;

    /// Look up a tracked job; `None` if the coordinator does not know it.
    async fn get_job(&self, id: JobId) -> Result<Option<JobEntry>, ApiError>;

    /// List tracked jobs, newest first.
    async fn list_jobs(&self, query: JobQuery) -> Result<Vec<JobEntry>, ApiError>;
}
