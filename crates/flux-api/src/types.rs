use serde::{Deserialize, Serialize};
use serde_json::Value;

use flux_model::{Errno, JobEntry, JobId};

/// Body of `POST /api/v1/jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    /// Encoded jobspec string. Any other JSON value is a type mismatch.
    #[serde(default)]
    pub jobspec: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub id: JobId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobEntry>,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errnum: Option<Errno>,
}
