//! Request and response payloads exchanged with the coordinator.

use serde::{Deserialize, Serialize};

use crate::{Errno, JobEntry, JobId, Priority, SubmitFlags};

pub const INGEST_SUBMIT: &str = "job-ingest.submit";
pub const INGEST_GETINFO: &str = "job-ingest.getinfo";
pub const INGEST_SHUTDOWN: &str = "job-ingest.shutdown";
pub const MANAGER_SUBMIT: &str = "job-manager.submit";
pub const MANAGER_GETINFO: &str = "job-manager.getinfo";
pub const MANAGER_LIST: &str = "job-manager.list";
pub const MANAGER_PRIORITY: &str = "job-manager.priority";
pub const MANAGER_LOOKUP: &str = "job-manager.lookup";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Signed envelope wrapping the encoded jobspec.
    #[serde(rename = "J")]
    pub j: String,
    pub priority: Priority,
    pub flags: SubmitFlags,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: JobId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IngestInfo {
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceRequest {
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ManagerInfo {
    pub max_jobid: JobId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LookupRequest {
    pub id: JobId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityRequest {
    pub id: JobId,
    pub priority: Priority,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errnum: Errno,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errstr: Option<String>,
}
