use std::fmt;

use flux_model::{Errno, wire::ErrorBody};
use thiserror::Error;

/// Error returned by the coordinator, or by the connection on its behalf.
///
/// The payload is propagated to callers unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    errnum: Errno,
    errstr: Option<String>,
}

impl RpcError {
    pub fn new(errnum: Errno, errstr: Option<String>) -> Self {
        Self { errnum, errstr }
    }

    /// Connection went away before a response arrived.
    pub fn disconnected() -> Self {
        Self::new(Errno::ECONNRESET, None)
    }

    /// Response could not be decoded.
    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::new(Errno::EPROTO, Some(detail.into()))
    }

    #[inline]
    pub fn errnum(&self) -> Errno {
        self.errnum
    }

    #[inline]
    pub fn errstr(&self) -> Option<&str> {
        self.errstr.as_deref()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.errstr {
            Some(msg) => f.write_str(msg),
            None => write!(f, "{}", self.errnum),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<ErrorBody> for RpcError {
    fn from(body: ErrorBody) -> Self {
        Self::new(body.errnum, body.errstr)
    }
}

impl From<RpcError> for ErrorBody {
    fn from(err: RpcError) -> Self {
        ErrorBody {
            errnum: err.errnum,
            errstr: err.errstr,
        }
    }
}

/// Failure of a client-side job operation.
#[derive(Debug, Error)]
pub enum JobError {
    /// A required argument was absent or empty. Raised before any request is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Caller passed the wrong kind of value, e.g. a structured document instead of its encoding.
    #[error("type mismatch: jobspec must be an encoded string, got {0}")]
    TypeMismatch(&'static str),

    /// Coordinator or connection failure, passed through as-is.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl JobError {
    /// POSIX classification of the error, if it has one.
    ///
    /// Type mismatches are caller bugs and carry no errno.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            JobError::InvalidArgument(_) => Some(Errno::EINVAL),
            JobError::TypeMismatch(_) => None,
            JobError::Rpc(e) => Some(e.errnum()),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, JobError::InvalidArgument(_))
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, JobError::TypeMismatch(_))
    }
}
