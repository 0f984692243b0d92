use std::time::Duration;

use flux_model::UserId;

/// Ingest tuning.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Longest time a submission waits before its batch is committed.
    ///
    /// Larger values save commits under load at the cost of per-job latency.
    pub batch_timeout: Duration,
    /// FLUID generator id, unique per ingest instance.
    pub generator_id: u16,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_timeout: Duration::from_millis(10),
            generator_id: 0,
        }
    }
}

/// Settings of a whole coordinator instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceConfig {
    /// User who owns the instance; gets the owner role.
    pub owner_userid: UserId,
    pub ingest: IngestConfig,
}
