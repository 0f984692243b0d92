use serde_json::Value;
use tracing::{debug, instrument};

use flux_model::{
    JobId, Priority, SubmitFlags, sign,
    wire::{self, SubmitRequest, SubmitResponse},
};

use crate::{
    error::{JobError, RpcError},
    handle::Handle,
    rpc::Rpc,
};

/// Per-submission options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub priority: Priority,
    pub flags: SubmitFlags,
}

impl SubmitOptions {
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_flags(mut self, flags: SubmitFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Submission whose request has been sent but whose id has not been retrieved yet.
#[derive(Debug)]
pub struct PendingSubmit {
    rpc: Rpc,
}

impl PendingSubmit {
    /// Wait for the coordinator to assign an id.
    pub async fn get_id(self) -> Result<JobId, JobError> {
        let resp: SubmitResponse = self.rpc.get_unpack().await?;
        if !resp.id.is_valid() {
            return Err(RpcError::protocol("coordinator assigned job id 0").into());
        }
        debug!(id = %resp.id, "job submitted");
        Ok(resp.id)
    }
}

/// Send a jobspec to the coordinator without waiting for the result.
///
/// `jobspec` must be the encoded jobspec as a JSON string value. Checks, in order:
/// a missing handle and a missing or empty jobspec are invalid arguments,
/// any non-string value is a type mismatch, unknown flag bits are invalid arguments.
/// Nothing is sent when a check fails.
#[instrument(level = "debug", skip_all, fields(priority = %opts.priority, flags = opts.flags.bits()))]
pub fn submit_async<H>(
    h: Option<&H>,
    jobspec: Option<&Value>,
    opts: SubmitOptions,
) -> Result<PendingSubmit, JobError>
where
    H: Handle + ?Sized,
{
    let h = h.ok_or(JobError::InvalidArgument("handle is required"))?;
    let encoded = encoded_jobspec(jobspec)?;
    if !opts.flags.within(SubmitFlags::CLIENT_MASK) {
        return Err(JobError::InvalidArgument("unknown submit flags"));
    }

    let envelope = if opts.flags.contains(SubmitFlags::PRE_SIGNED) {
        encoded.to_string()
    } else {
        sign::wrap_none(encoded.as_bytes(), h.userid())
    };
    let req = SubmitRequest {
        j: envelope,
        priority: opts.priority,
        flags: opts.flags.without(SubmitFlags::PRE_SIGNED),
    };
    let payload = serde_json::to_value(&req)
        .map_err(|e| RpcError::protocol(format!("encode submit request: {e}")))?;

    let rpc = h.rpc(wire::INGEST_SUBMIT, payload)?;
    debug!("submit request sent");
    Ok(PendingSubmit { rpc })
}

/// Retrieve the id of a pending submission.
///
/// A missing submission is an invalid argument.
pub async fn submit_get_id(pending: Option<PendingSubmit>) -> Result<JobId, JobError> {
    pending
        .ok_or(JobError::InvalidArgument("pending submission is required"))?
        .get_id()
        .await
}

/// Submit a jobspec and wait for its id.
///
/// Every successful call creates a new job, even with identical input.
pub async fn submit<H>(
    h: Option<&H>,
    jobspec: Option<&Value>,
    opts: SubmitOptions,
) -> Result<JobId, JobError>
where
    H: Handle + ?Sized,
{
    submit_async(h, jobspec, opts)?.get_id().await
}

fn encoded_jobspec(jobspec: Option<&Value>) -> Result<&str, JobError> {
    match jobspec {
        None | Some(Value::Null) => Err(JobError::InvalidArgument("jobspec is required")),
        Some(Value::String(s)) if s.is_empty() => {
            Err(JobError::InvalidArgument("jobspec is empty"))
        }
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(Value::Bool(_)) => Err(JobError::TypeMismatch("boolean")),
        Some(Value::Number(_)) => Err(JobError::TypeMismatch("number")),
        Some(Value::Array(_)) => Err(JobError::TypeMismatch("array")),
        Some(Value::Object(_)) => Err(JobError::TypeMismatch("object")),
    }
}
