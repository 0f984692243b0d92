use serde::{Deserialize, Serialize};

use crate::{JobId, Priority, SubmitFlags, UserId};

/// Job record announced by ingest and tracked by the job manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    /// Assigned identifier.
    pub id: JobId,
    /// Submitting user.
    pub userid: UserId,
    /// Current priority.
    pub priority: Priority,
    /// Submission time, seconds since the unix epoch.
    pub t_submit: f64,
    /// Flags as accepted by ingest.
    #[serde(default)]
    pub flags: SubmitFlags,
}
