//! Remote front for job submission.
//!
//! [`ApiHandler`] is the seam between transports and the coordinator. [`GatewayAdapter`]
//! implements it over any [`flux_job::Handle`]; [`HttpApi`] mounts it on an axum router and
//! [`HttpClient`] talks to that router.

mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::GatewayAdapter;

mod types;
pub use types::{ErrorResponse, GetJobResponse, ListJobsResponse, SubmitJobRequest, SubmitJobResponse};

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;

#[cfg(feature = "client")]
mod client;

#[cfg(feature = "client")]
pub use client::HttpClient;
