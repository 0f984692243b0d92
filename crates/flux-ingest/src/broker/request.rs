use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use flux_job::{Responder, RpcError};
use flux_model::{Cred, Errno};

/// Request as seen by a service.
#[derive(Debug)]
pub struct Request {
    payload: Value,
    cred: Cred,
    responder: Responder,
}

impl Request {
    /// The topic is taken from the responder.
    pub fn new(payload: Value, cred: Cred, responder: Responder) -> Self {
        Self {
            payload,
            cred,
            responder,
        }
    }

    #[inline]
    pub fn topic(&self) -> &str {
        self.responder.topic()
    }

    #[inline]
    pub fn cred(&self) -> Cred {
        self.cred
    }

    #[inline]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Decode the payload; failure is EPROTO.
    pub fn unpack<T>(&self) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        T::deserialize(&self.payload)
            .map_err(|e| RpcError::protocol(format!("{}: {e}", self.topic())))
    }

    pub fn respond(self, payload: Value) {
        self.responder.respond(payload);
    }

    pub fn respond_pack<T>(self, body: &T)
    where
        T: Serialize,
    {
        match serde_json::to_value(body) {
            Ok(payload) => self.responder.respond(payload),
            Err(e) => {
                warn!(topic = self.topic(), error = %e, "failed to encode response");
                self.responder
                    .respond_error(Errno::EPROTO, Some(format!("encode response: {e}")));
            }
        }
    }

    pub fn respond_error(self, errnum: Errno, errstr: Option<String>) {
        self.responder.respond_error(errnum, errstr);
    }

    pub fn respond_rpc_error(self, err: RpcError) {
        self.responder.send(Err(err));
    }

    /// Detach the responder to answer later, e.g. after batching.
    pub fn into_responder(self) -> Responder {
        self.responder
    }
}
