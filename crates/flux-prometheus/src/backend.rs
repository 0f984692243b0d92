use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use flux_ingest::IngestMetrics;
use flux_model::Errno;

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    accepted: IntCounter,
    rejected: IntCounterVec,
    batches: IntCounterVec,
    batch_size: Histogram,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register the collectors in an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let accepted = IntCounter::with_opts(Opts::new(
            "flux_ingest_jobs_accepted_total",
            "Submissions accepted into a batch",
        ))?;
        let rejected = IntCounterVec::new(
            Opts::new(
                "flux_ingest_jobs_rejected_total",
                "Submissions refused by ingest",
            ),
            &["errno"],
        )?;
        let batches = IntCounterVec::new(
            Opts::new("flux_ingest_batches_total", "Batches flushed"),
            &["outcome"],
        )?;
        let batch_size = Histogram::with_opts(
            HistogramOpts::new("flux_ingest_batch_size", "Jobs per flushed batch")
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0]),
        )?;

        registry.register(Box::new(accepted.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(batches.clone()))?;
        registry.register(Box::new(batch_size.clone()))?;

        Ok(Self {
            registry,
            accepted,
            rejected,
            batches,
            batch_size,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format, as served on `/metrics`.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl IngestMetrics for PrometheusMetrics {
    fn job_accepted(&self) {
        self.accepted.inc();
    }

    fn job_rejected(&self, errnum: Errno) {
        let code = errnum.code().to_string();
        self.rejected.with_label_values(&[code.as_str()]).inc();
    }

    fn batch_flushed(&self, jobs: usize, announced: bool) {
        let outcome = if announced { "announced" } else { "failed" };
        self.batches.with_label_values(&[outcome]).inc();
        self.batch_size.observe(jobs as f64);
    }
}
