use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

use flux_model::Errno;

use crate::error::RpcError;

type Reply = Result<Value, RpcError>;

/// Pending response to a request that has already been sent.
#[derive(Debug)]
pub struct Rpc {
    topic: String,
    rx: oneshot::Receiver<Reply>,
}

/// Sending half of an [`Rpc`], held by whoever services the request.
#[derive(Debug)]
pub struct Responder {
    topic: String,
    tx: oneshot::Sender<Reply>,
}

impl Rpc {
    /// Create a linked responder/rpc pair for `topic`.
    pub fn channel(topic: impl Into<String>) -> (Responder, Rpc) {
        let topic = topic.into();
        let (tx, rx) = oneshot::channel();
        (
            Responder {
                topic: topic.clone(),
                tx,
            },
            Rpc { topic, rx },
        )
    }

    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the response payload.
    ///
    /// A responder dropped without answering yields ECONNRESET.
    pub async fn get(self) -> Result<Value, RpcError> {
        match self.rx.await {
            Ok(reply) => reply,
            Err(_) => Err(RpcError::disconnected()),
        }
    }

    /// Wait for the response and decode it into `T`.
    pub async fn get_unpack<T>(self) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        let topic = self.topic.clone();
        let value = self.get().await?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::protocol(format!("{topic}: malformed response: {e}")))
    }
}

impl Responder {
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn respond(self, payload: Value) {
        self.send(Ok(payload));
    }

    pub fn respond_error(self, errnum: Errno, errstr: Option<String>) {
        self.send(Err(RpcError::new(errnum, errstr)));
    }

    pub fn send(self, reply: Reply) {
        if self.tx.send(reply).is_err() {
            trace!(topic = %self.topic, "requestor went away before response");
        }
    }
}
