use serde_json::Value;
use tokio::sync::mpsc;

use flux_job::{Handle, Rpc, RpcError};
use flux_model::{Cred, UserId};

use super::Request;

/// In-process connection to a [`Broker`](super::Broker).
///
/// Cheap to clone; clones share the broker channel and credentials.
#[derive(Clone, Debug)]
pub struct LocalHandle {
    tx: mpsc::UnboundedSender<Request>,
    cred: Cred,
}

impl LocalHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Request>, cred: Cred) -> Self {
        Self { tx, cred }
    }

    #[inline]
    pub fn cred(&self) -> Cred {
        self.cred
    }
}

impl Handle for LocalHandle {
    fn rpc(&self, topic: &str, payload: Value) -> Result<Rpc, RpcError> {
        let (responder, rpc) = Rpc::channel(topic);
        let req = Request::new(payload, self.cred, responder);
        self.tx.send(req).map_err(|_| RpcError::disconnected())?;
        Ok(rpc)
    }

    fn userid(&self) -> UserId {
        self.cred.userid
    }
}
