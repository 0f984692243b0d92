//! `job-ingest` service: entry point for new jobs.
//!
//! For each submission:
//! 1) check flags, priority and role restrictions;
//! 2) unwrap the signed envelope and match the signer against the requestor;
//! 3) validate the jobspec;
//! 4) assign an id and add the job to the current batch.
//!
//! A batch is flushed `batch_timeout` after its first job arrives: its records are committed to
//! the KVS in one transaction, then the jobs are announced to the job manager in one request.
//! Requestors get their id only after the announce succeeds. If it fails, every requestor in the
//! batch gets the job manager's error and the records are removed again.

mod batch;
mod eventlog;
mod fluid;
mod validate;

pub use fluid::FluidGenerator;
pub use validate::{BasicValidator, ValidationError, Validator};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use flux_job::{Handle, Responder, RpcError};
use flux_model::{
    Errno, JobEntry, Priority, SubmitFlags, sign,
    wire::{self, AnnounceRequest, IngestInfo, ManagerInfo, SubmitRequest},
};

use crate::{
    broker::{Request, Service},
    config::IngestConfig,
    error::IngestError,
    kvs::Kvs,
    metrics::IngestMetrics,
};
use batch::{Admitted, Batch};

pub const NAME: &str = "job-ingest";

pub struct IngestService {
    shared: Arc<Shared>,
}

struct Shared {
    h: Arc<dyn Handle>,
    kvs: Kvs,
    validator: Arc<dyn Validator>,
    metrics: Arc<dyn IngestMetrics>,
    config: IngestConfig,
    state: Mutex<IngestState>,
}

struct IngestState {
    generator: FluidGenerator,
    batch: Option<Batch>,
    /// No new jobs are accepted once set.
    shutdown: bool,
}

impl IngestService {
    /// Prepare the service, seeding the id generator past the job manager's largest id.
    ///
    /// `h` must be an owner connection to a broker that already has `job-manager` loaded.
    #[instrument(level = "debug", skip_all, fields(generator = config.generator_id))]
    pub async fn load(
        h: Arc<dyn Handle>,
        kvs: Kvs,
        config: IngestConfig,
        validator: Arc<dyn Validator>,
        metrics: Arc<dyn IngestMetrics>,
    ) -> Result<Self, IngestError> {
        let info: ManagerInfo = h
            .rpc(wire::MANAGER_GETINFO, json!({}))?
            .get_unpack()
            .await
            .map_err(|e| {
                if e.errnum() == Errno::ENOSYS {
                    IngestError::ManagerNotLoaded
                } else {
                    IngestError::Rpc(e)
                }
            })?;

        let start = info.max_jobid.timestamp() + 1;
        let generator = FluidGenerator::new(config.generator_id, start)?;
        debug!(start, "id generator ready");

        Ok(Self {
            shared: Arc::new(Shared {
                h,
                kvs,
                validator,
                metrics,
                config,
                state: Mutex::new(IngestState {
                    generator,
                    batch: None,
                    shutdown: false,
                }),
            }),
        })
    }

    #[instrument(level = "debug", skip_all, fields(userid = req.cred().userid))]
    async fn submit(&self, req: Request) {
        match self.admit(&req).await {
            Ok(job) => self.enqueue(job, req.into_responder()),
            Err(e) => {
                debug!(errnum = e.errnum().code(), error = %e, "submit rejected");
                self.shared.metrics.job_rejected(e.errnum());
                req.respond_rpc_error(e);
            }
        }
    }

    async fn admit(&self, req: &Request) -> Result<Admitted, RpcError> {
        if self.shared.state.lock().unwrap().shutdown {
            return Err(RpcError::new(Errno::ENOSYS, None));
        }

        let cred = req.cred();
        let r: SubmitRequest = req.unpack()?;

        if !r.flags.within(SubmitFlags::WIRE_MASK) {
            return Err(RpcError::new(Errno::EPROTO, None));
        }
        if !r.priority.in_range() {
            return Err(einval(format!(
                "priority range is [{}:{}]",
                Priority::MIN,
                Priority::MAX
            )));
        }
        if !cred.is_owner() && !r.priority.guest_allowed() {
            return Err(einval(format!(
                "only the instance owner can submit with priority >{}",
                Priority::DEFAULT
            )));
        }
        if !cred.is_owner() && r.flags.contains(SubmitFlags::WAITABLE) {
            return Err(einval(
                "only the instance owner can submit with FLUX_JOB_WAITABLE".to_string(),
            ));
        }

        let unwrapped = sign::unwrap_none(&r.j)
            .map_err(|_| einval("could not unwrap jobspec".to_string()))?;
        if unwrapped.userid != cred.userid {
            return Err(RpcError::new(
                Errno::EPERM,
                Some(format!(
                    "signer={} != requestor={}",
                    unwrapped.userid, cred.userid
                )),
            ));
        }
        if !cred.is_owner() && unwrapped.mechanism == sign::MECH_NONE {
            return Err(RpcError::new(
                Errno::EPERM,
                Some("only instance owner can use sign-type=none".into()),
            ));
        }

        self.shared
            .validator
            .validate(&unwrapped.payload)
            .await
            .map_err(|e| einval(e.to_string()))?;

        Ok(Admitted {
            envelope: r.j,
            jobspec: unwrapped.payload,
            cred,
            priority: r.priority,
            flags: r.flags,
        })
    }

    fn enqueue(&self, job: Admitted, responder: Responder) {
        let mut state = self.shared.state.lock().unwrap();

        let id = match state.generator.generate() {
            Ok(id) => id,
            Err(e) => {
                drop(state);
                warn!(error = %e, "id generation failed");
                self.shared.metrics.job_rejected(Errno::EOVERFLOW);
                return responder.respond_error(Errno::EOVERFLOW, Some(e.to_string()));
            }
        };

        let start_timer = state.batch.is_none();
        state
            .batch
            .get_or_insert_with(Batch::new)
            .add_job(id, job, responder);
        drop(state);

        self.shared.metrics.job_accepted();
        debug!(%id, "job added to batch");

        if start_timer {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                tokio::time::sleep(shared.config.batch_timeout).await;
                flush(shared).await;
            });
        }
    }

    fn getinfo(&self, req: Request) {
        let timestamp = self.shared.state.lock().unwrap().generator.timestamp();
        match timestamp {
            Ok(timestamp) => req.respond_pack(&IngestInfo { timestamp }),
            Err(_) => req.respond_error(Errno::EOVERFLOW, None),
        }
    }

    fn shutdown(&self, req: Request) {
        if !req.cred().is_owner() {
            return req.respond_error(Errno::EPERM, None);
        }
        self.shared.state.lock().unwrap().shutdown = true;
        info!("ingest shutting down, new submissions refused");
        req.respond(json!({}));
    }
}

#[async_trait]
impl Service for IngestService {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn handle(&self, method: &str, req: Request) {
        match method {
            "submit" => self.submit(req).await,
            "getinfo" => self.getinfo(req),
            "shutdown" => self.shutdown(req),
            _ => req.respond_error(Errno::ENOSYS, None),
        }
    }
}

/// Commit, announce and answer the current batch.
async fn flush(shared: Arc<Shared>) {
    let batch = shared.state.lock().unwrap().batch.take();
    let Some(batch) = batch else {
        return;
    };

    let count = batch.len();
    let cleanup = batch.cleanup_txn();
    let Batch {
        responders,
        txn,
        joblist,
    } = batch;

    shared.kvs.commit(txn);

    match announce(shared.h.as_ref(), joblist).await {
        Ok(()) => {
            for (id, responder) in responders {
                responder.respond(json!({ "id": id }));
            }
            info!(count, "batch ingested");
            shared.metrics.batch_flushed(count, true);
        }
        Err(e) => {
            warn!(count, error = %e, "job-manager announce failed");
            for (_, responder) in responders {
                responder.send(Err(e.clone()));
            }
            shared.kvs.commit(cleanup);
            shared.metrics.batch_flushed(count, false);
        }
    }
}

async fn announce(h: &dyn Handle, jobs: Vec<JobEntry>) -> Result<(), RpcError> {
    let payload: Value = serde_json::to_value(AnnounceRequest { jobs })
        .map_err(|e| RpcError::protocol(format!("encode announce: {e}")))?;
    h.rpc(wire::MANAGER_SUBMIT, payload)?.get().await?;
    Ok(())
}

fn einval(msg: String) -> RpcError {
    RpcError::new(Errno::EINVAL, Some(msg))
}
