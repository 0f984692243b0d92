//! `job-manager` service: the coordinator's record of accepted jobs.

mod state;
pub use state::JobTable;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, instrument};

use flux_job::RpcError;
use flux_model::{
    Errno, Priority,
    wire::{AnnounceRequest, ListResponse, LookupRequest, ManagerInfo, PriorityRequest},
};

use crate::broker::{Request, Service};

pub const NAME: &str = "job-manager";

pub struct JobManager {
    jobs: JobTable,
}

impl JobManager {
    pub fn new(jobs: JobTable) -> Self {
        Self { jobs }
    }

    /// Accept newly ingested jobs.
    #[instrument(level = "debug", skip_all)]
    fn submit(&self, req: Request) {
        if !req.cred().is_owner() {
            return req.respond_error(Errno::EPERM, Some("only the instance owner can add jobs".into()));
        }
        let announce: AnnounceRequest = match req.unpack() {
            Ok(announce) => announce,
            Err(e) => return req.respond_rpc_error(e),
        };

        if let Err(dup) = self.jobs.insert_batch(&announce.jobs) {
            return req.respond_error(Errno::EEXIST, Some(format!("job {dup} already exists")));
        }
        info!(count = announce.jobs.len(), "jobs added");
        req.respond(json!({}));
    }

    fn getinfo(&self, req: Request) {
        let info = ManagerInfo {
            max_jobid: self.jobs.max_jobid(),
        };
        req.respond_pack(&info);
    }

    fn list(&self, req: Request) {
        let query = match req.unpack() {
            Ok(query) => query,
            Err(e) => return req.respond_rpc_error(e),
        };
        req.respond_pack(&ListResponse {
            jobs: self.jobs.query(&query),
        });
    }

    fn lookup(&self, req: Request) {
        let lookup: LookupRequest = match req.unpack() {
            Ok(lookup) => lookup,
            Err(e) => return req.respond_rpc_error(e),
        };
        match self.jobs.get(lookup.id) {
            Some(entry) => req.respond_pack(&entry),
            None => req.respond_error(Errno::ENOENT, Some(format!("unknown job id {}", lookup.id))),
        }
    }

    /// Adjust the priority of a tracked job.
    ///
    /// Guests may only touch their own jobs and may not go above the default priority.
    #[instrument(level = "debug", skip_all)]
    fn priority(&self, req: Request) {
        match self.check_priority(&req) {
            Ok(r) => {
                self.jobs.set_priority(r.id, r.priority);
                debug!(id = %r.id, priority = %r.priority, "priority changed");
                req.respond(json!({}));
            }
            Err(e) => req.respond_rpc_error(e),
        }
    }

    fn check_priority(&self, req: &Request) -> Result<PriorityRequest, RpcError> {
        let r: PriorityRequest = req.unpack()?;
        let cred = req.cred();

        if !r.priority.in_range() {
            return Err(RpcError::new(
                Errno::EINVAL,
                Some(format!(
                    "priority range is [{}:{}]",
                    Priority::MIN,
                    Priority::MAX
                )),
            ));
        }
        let Some(entry) = self.jobs.get(r.id) else {
            return Err(RpcError::new(
                Errno::ENOENT,
                Some(format!("unknown job id {}", r.id)),
            ));
        };
        if !cred.is_owner() && entry.userid != cred.userid {
            return Err(RpcError::new(
                Errno::EPERM,
                Some("guests can only reprioritize their own jobs".into()),
            ));
        }
        if !cred.is_owner() && !r.priority.guest_allowed() {
            return Err(RpcError::new(
                Errno::EPERM,
                Some(format!(
                    "guests can only adjust priority <= {}",
                    Priority::DEFAULT
                )),
            ));
        }
        Ok(r)
    }
}

#[async_trait]
impl Service for JobManager {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn handle(&self, method: &str, req: Request) {
        match method {
            "submit" => self.submit(req),
            "getinfo" => self.getinfo(req),
            "list" => self.list(req),
            "lookup" => self.lookup(req),
            "priority" => self.priority(req),
            _ => req.respond_error(Errno::ENOSYS, None),
        }
    }
}
