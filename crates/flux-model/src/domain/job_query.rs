use serde::{Deserialize, Serialize};

use crate::UserId;

/// Filters for listing tracked jobs, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<UserId>,
    #[serde(default = "default_limit")]
    pub max_entries: usize,
}

fn default_limit() -> usize {
    JobQuery::DEFAULT_ENTRIES
}

impl JobQuery {
    pub const DEFAULT_ENTRIES: usize = 100;
    pub const MAX_ENTRIES: usize = 1000;

    pub fn new() -> Self {
        Self {
            userid: None,
            max_entries: Self::DEFAULT_ENTRIES,
        }
    }

    pub fn with_userid(mut self, userid: UserId) -> Self {
        self.userid = Some(userid);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.max_entries = limit.min(Self::MAX_ENTRIES);
        self
    }

    /// Effective entry limit; requests decoded off the wire may ask for more than allowed.
    pub fn limit(&self) -> usize {
        self.max_entries.min(Self::MAX_ENTRIES)
    }
}

impl Default for JobQuery {
    fn default() -> Self {
        Self::new()
    }
}
