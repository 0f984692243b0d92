use serde_json::Value;
use tracing::{debug, instrument};

use flux_model::{
    JobEntry, JobId, JobQuery, Priority,
    wire::{self, ListResponse, LookupRequest, PriorityRequest},
};

use crate::{
    error::{JobError, RpcError},
    handle::Handle,
};

/// Change the priority of a job tracked by the coordinator.
#[instrument(level = "debug", skip(h))]
pub async fn set_priority<H>(h: Option<&H>, id: JobId, priority: i32) -> Result<(), JobError>
where
    H: Handle + ?Sized,
{
    let h = h.ok_or(JobError::InvalidArgument("handle is required"))?;
    if !id.is_valid() {
        return Err(JobError::InvalidArgument("job id must be positive"));
    }
    let priority =
        Priority::new(priority).map_err(|_| JobError::InvalidArgument("priority out of range"))?;

    let payload = to_payload(&PriorityRequest { id, priority })?;
    h.rpc(wire::MANAGER_PRIORITY, payload)?.get().await?;
    debug!("priority updated");
    Ok(())
}

/// Fetch a single tracked job.
pub async fn lookup_job<H>(h: &H, id: JobId) -> Result<JobEntry, JobError>
where
    H: Handle + ?Sized,
{
    let payload = to_payload(&LookupRequest { id })?;
    Ok(h.rpc(wire::MANAGER_LOOKUP, payload)?.get_unpack().await?)
}

/// List tracked jobs, newest first.
pub async fn list_jobs<H>(h: &H, query: &JobQuery) -> Result<Vec<JobEntry>, JobError>
where
    H: Handle + ?Sized,
{
    let payload = to_payload(query)?;
    let resp: ListResponse = h.rpc(wire::MANAGER_LIST, payload)?.get_unpack().await?;
    Ok(resp.jobs)
}

fn to_payload<T: serde::Serialize>(req: &T) -> Result<Value, RpcError> {
    serde_json::to_value(req).map_err(|e| RpcError::protocol(format!("encode request: {e}")))
}
