//! Topic-routed request dispatch.
//!
//! Topics have the form `<service>.<method>`. Each request is handed to the service registered
//! under `<service>` on its own task, so a slow handler never stalls the dispatch loop.

mod handle;
pub use handle::LocalHandle;

mod request;
pub use request::Request;

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use flux_model::{Cred, Errno};

use crate::error::IngestError;

/// Handler for every topic under one service name.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Service name, the first topic component.
    fn name(&self) -> &'static str;

    /// Handle one request. `method` is the topic with the service prefix removed.
    async fn handle(&self, method: &str, req: Request);
}

type Services = Arc<RwLock<HashMap<&'static str, Arc<dyn Service>>>>;

pub struct Broker {
    tx: mpsc::UnboundedSender<Request>,
    services: Services,
    token: CancellationToken,
}

impl Broker {
    /// Start the dispatch loop on the current tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let services: Services = Arc::new(RwLock::new(HashMap::new()));
        let token = CancellationToken::new();

        tokio::spawn(dispatch(rx, Arc::clone(&services), token.clone()));
        debug!("broker started");

        Self {
            tx,
            services,
            token,
        }
    }

    /// Load a service. Names must be unique.
    pub fn register(&self, service: Arc<dyn Service>) -> Result<(), IngestError> {
        let mut services = self.services.write().unwrap();
        let name = service.name();
        if services.contains_key(name) {
            return Err(IngestError::DuplicateService(name.to_string()));
        }
        services.insert(name, service);
        debug!(service = name, "service registered");
        Ok(())
    }

    /// Open a connection that stamps `cred` on every request.
    pub fn connect(&self, cred: Cred) -> LocalHandle {
        LocalHandle::new(self.tx.clone(), cred)
    }

    /// Stop dispatching. Queued and future requests fail with ECONNRESET.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<Request>,
    services: Services,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            req = rx.recv() => match req {
                Some(req) => route(&services, req),
                None => break,
            },
        }
    }
    rx.close();
    debug!("broker dispatch loop stopped");
}

fn route(services: &Services, req: Request) {
    let Some((service, method)) = req.topic().split_once('.') else {
        trace!(topic = req.topic(), "malformed topic");
        req.respond_error(Errno::ENOSYS, None);
        return;
    };
    let service = services.read().unwrap().get(service).cloned();
    let Some(service) = service else {
        trace!(topic = req.topic(), "no service for topic");
        req.respond_error(Errno::ENOSYS, None);
        return;
    };

    let method = method.to_string();
    tokio::spawn(async move {
        service.handle(&method, req).await;
    });
}
