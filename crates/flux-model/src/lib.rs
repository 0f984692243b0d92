//! Shared domain types for job submission.
//!
//! Everything that crosses the connection between a submitting client and the coordinator lives here:
//! identifiers, credentials, request/response payloads and the jobspec encodings.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;

pub mod jobspec;
pub mod sign;
pub mod wire;
