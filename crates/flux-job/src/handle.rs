use std::sync::Arc;

use flux_model::UserId;
use serde_json::Value;

use crate::{error::RpcError, rpc::Rpc};

/// Open connection to the coordinator.
///
/// Implementations stamp their own credentials on outgoing requests and must be safe to share
/// between concurrent callers; the functions of this crate never lock or clone a handle.
pub trait Handle: Send + Sync {
    /// Send a request without waiting for the response.
    fn rpc(&self, topic: &str, payload: Value) -> Result<Rpc, RpcError>;

    /// User this connection is authenticated as.
    fn userid(&self) -> UserId;
}

impl<T> Handle for Arc<T>
where
    T: Handle + ?Sized,
{
    fn rpc(&self, topic: &str, payload: Value) -> Result<Rpc, RpcError> {
        (**self).rpc(topic, payload)
    }

    fn userid(&self) -> UserId {
        (**self).userid()
    }
}
