//! Prometheus metrics backend for job ingest.
//!
//! [`PrometheusMetrics`] implements [`flux_ingest::IngestMetrics`] and keeps its collectors in
//! its own [`Registry`].
//!
//! ```rust,ignore
//! let metrics = PrometheusMetrics::new()?;
//! let instance = Instance::builder(config)
//!     .with_metrics(Arc::new(metrics.clone()))
//!     .start()
//!     .await?;
//!
//! let body = metrics.encode_text()?;
//! ```
//!
//! ## Metrics
//! - `flux_ingest_jobs_accepted_total` - Counter
//! - `flux_ingest_jobs_rejected_total{errno}` - Counter
//! - `flux_ingest_batches_total{outcome}` - Counter, outcome is `announced` or `failed`
//! - `flux_ingest_batch_size` - Histogram
//!
//! No HTTP endpoint is provided here; the daemon serves [`PrometheusMetrics::encode_text`]
//! on `/metrics`.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
