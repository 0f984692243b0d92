use thiserror::Error;

use flux_job::JobError;
use flux_model::Errno;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Job(#[from] JobError),

    /// Error reported by a remote API, as seen by [`HttpClient`](crate::HttpClient).
    #[error("{message} (status {status})")]
    Remote {
        status: u16,
        message: String,
        errnum: Option<Errno>,
    },

    #[cfg(feature = "client")]
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// POSIX classification of the error, if any.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            ApiError::InvalidRequest(_) => Some(Errno::EINVAL),
            ApiError::Job(e) => e.errno(),
            ApiError::Remote { errnum, .. } => *errnum,
            #[cfg(feature = "client")]
            ApiError::Transport(_) => None,
        }
    }

    /// HTTP status code the error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::Job(JobError::InvalidArgument(_)) => 400,
            ApiError::Job(JobError::TypeMismatch(_)) => 422,
            ApiError::Job(JobError::Rpc(e)) => match e.errnum() {
                Errno::EINVAL | Errno::EPROTO => 400,
                Errno::EPERM => 403,
                Errno::ENOENT => 404,
                Errno::EEXIST => 409,
                Errno::ENOSYS => 503,
                _ => 500,
            },
            ApiError::Remote { status, .. } => *status,
            #[cfg(feature = "client")]
            ApiError::Transport(_) => 502,
        }
    }
}
