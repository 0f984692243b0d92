//! In-process coordinator.
//!
//! An [`Instance`] runs a message [`Broker`](broker::Broker) with two services loaded:
//! - `job-manager`: tracks accepted jobs;
//! - `job-ingest`: checks, numbers, batches and records submitted jobspecs, then announces
//!   them to the job manager.
//!
//! Clients talk to it through [`LocalHandle`]s, which implement [`flux_job::Handle`].

mod config;
pub use config::{IngestConfig, InstanceConfig};

mod error;
pub use error::IngestError;

mod metrics;
pub use metrics::{IngestMetrics, NoopMetrics};

pub mod broker;
pub use broker::{Broker, LocalHandle, Request, Service};

pub mod ingest;
pub use ingest::{BasicValidator, IngestService, ValidationError, Validator};

pub mod kvs;
pub use kvs::{Kvs, Txn};

pub mod manager;
pub use manager::{JobManager, JobTable};

mod instance;
pub use instance::{Instance, InstanceBuilder};
