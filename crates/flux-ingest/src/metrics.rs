use flux_model::Errno;

/// Observer of ingest activity, e.g. a metrics exporter.
pub trait IngestMetrics: Send + Sync + 'static {
    /// A submission passed all checks and joined a batch.
    fn job_accepted(&self);

    /// A submission was refused before joining a batch.
    fn job_rejected(&self, errnum: Errno);

    /// A batch was committed and announced (`announced == true`) or failed.
    fn batch_flushed(&self, jobs: usize, announced: bool);
}

/// Metrics backend that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl IngestMetrics for NoopMetrics {
    fn job_accepted(&self) {}
    fn job_rejected(&self, _errnum: Errno) {}
    fn batch_flushed(&self, _jobs: usize, _announced: bool) {}
}
