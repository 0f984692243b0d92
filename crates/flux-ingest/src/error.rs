use flux_job::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("job-manager must be loaded first")]
    ManagerNotLoaded,

    #[error("service already registered: {0}")]
    DuplicateService(String),

    #[error("invalid generator id {0} (max {max})", max = flux_model::JobId::MAX_GENERATOR)]
    GeneratorId(u16),

    #[error("job id timestamp overflow")]
    TimestampOverflow,

    #[error("rpc failed: {0}")]
    Rpc(#[from] RpcError),
}
