use std::sync::Arc;

use tracing::info;

use flux_model::Cred;

use crate::{
    broker::{Broker, LocalHandle},
    config::InstanceConfig,
    error::IngestError,
    ingest::{BasicValidator, IngestService, Validator},
    kvs::Kvs,
    manager::{JobManager, JobTable},
    metrics::{IngestMetrics, NoopMetrics},
};

/// Running coordinator: broker, KVS, job manager and ingest.
pub struct Instance {
    broker: Broker,
    config: InstanceConfig,
    kvs: Kvs,
    jobs: JobTable,
}

impl Instance {
    /// Start with the basic validator and no metrics.
    pub async fn start(config: InstanceConfig) -> Result<Self, IngestError> {
        Self::builder(config).start().await
    }

    pub fn builder(config: InstanceConfig) -> InstanceBuilder {
        InstanceBuilder {
            config,
            validator: Arc::new(BasicValidator),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Connect as an arbitrary user.
    pub fn connect(&self, cred: Cred) -> LocalHandle {
        self.broker.connect(cred)
    }

    /// Connect as the instance owner.
    pub fn owner(&self) -> LocalHandle {
        self.connect(Cred::owner(self.config.owner_userid))
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    pub fn kvs(&self) -> &Kvs {
        &self.kvs
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Stop the broker; outstanding and later requests fail with ECONNRESET.
    pub fn stop(&self) {
        self.broker.stop();
        info!("instance stopped");
    }
}

/// Customizes validation and metrics before [`Instance`] start.
pub struct InstanceBuilder {
    config: InstanceConfig,
    validator: Arc<dyn Validator>,
    metrics: Arc<dyn IngestMetrics>,
}

impl InstanceBuilder {
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn IngestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Load `job-manager`, then `job-ingest` on top of it.
    pub async fn start(self) -> Result<Instance, IngestError> {
        let broker = Broker::new();
        let kvs = Kvs::new();
        let jobs = JobTable::new();

        broker.register(Arc::new(JobManager::new(jobs.clone())))?;

        let h = broker.connect(Cred::owner(self.config.owner_userid));
        let ingest = IngestService::load(
            Arc::new(h),
            kvs.clone(),
            self.config.ingest.clone(),
            self.validator,
            self.metrics,
        )
        .await?;
        broker.register(Arc::new(ingest))?;

        info!(owner = self.config.owner_userid, "instance started");
        Ok(Instance {
            broker,
            config: self.config,
            kvs,
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use flux_job::{
        Handle, JobError, SubmitOptions, list_jobs, lookup_job, set_priority, submit, submit_async,
        submit_get_id,
    };
    use flux_model::{
        Errno, JobEntry, JobId, JobQuery, Priority, SubmitFlags, jobspec, sign,
        wire::{self, IngestInfo, ListResponse, ManagerInfo},
    };

    use super::*;
    use crate::{IngestConfig, Request, Service};

    const OWNER: u32 = 1000;
    const BASIC_YAML: &str = include_str!("../testdata/jobspec/valid/basic_v1.yaml");

    fn encoded(yaml: &str) -> Value {
        Value::String(jobspec::yaml_to_json(yaml).unwrap())
    }

    async fn instance() -> Instance {
        Instance::start(InstanceConfig {
            owner_userid: OWNER,
            ..Default::default()
        })
        .await
        .unwrap()
    }

    fn rpc_errno(err: JobError) -> Errno {
        match err {
            JobError::Rpc(e) => e.errnum(),
            other => panic!("expected coordinator error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_returns_positive_id() {
        let inst = instance().await;
        let h = inst.owner();

        let id = submit(Some(&h), Some(&encoded(BASIC_YAML)), SubmitOptions::default())
            .await
            .unwrap();
        assert!(id.is_valid());
    }

    #[tokio::test]
    async fn null_handle_and_null_jobspec_are_invalid_arguments() {
        let inst = instance().await;
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let err = submit::<LocalHandle>(None, Some(&spec), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.errno(), Some(Errno::EINVAL));

        let err = submit(Some(&h), None, SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = submit_get_id(None).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn structured_jobspec_is_type_mismatch() {
        let inst = instance().await;
        let h = inst.owner();

        let doc: Value = serde_json::from_str(&jobspec::yaml_to_json(BASIC_YAML).unwrap()).unwrap();
        let err = submit(Some(&h), Some(&doc), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(!err.is_invalid_argument());

        let err = submit(Some(&h), Some(&json!(42)), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(inst.jobs().is_empty());
    }

    #[tokio::test]
    async fn consecutive_submits_get_distinct_increasing_ids() {
        let inst = instance().await;
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let a = submit(Some(&h), Some(&spec), SubmitOptions::default()).await.unwrap();
        let b = submit(Some(&h), Some(&spec), SubmitOptions::default()).await.unwrap();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[tokio::test]
    async fn async_submits_share_a_batch() {
        let inst = instance().await;
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let pending: Vec<_> = (0..16)
            .map(|_| submit_async(Some(&h), Some(&spec), SubmitOptions::default()).unwrap())
            .collect();

        let mut ids = Vec::new();
        for p in pending {
            ids.push(submit_get_id(Some(p)).await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);
        assert_eq!(inst.jobs().len(), 16);
    }

    #[tokio::test]
    async fn accepted_job_is_recorded() {
        let inst = instance().await;
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let id = submit(
            Some(&h),
            Some(&spec),
            SubmitOptions::default().with_priority(Priority::new(20).unwrap()),
        )
        .await
        .unwrap();

        let kvs = inst.kvs();
        let stored = kvs.get_string(&id.kvs_key(Some("jobspec"))).unwrap();
        assert_eq!(Value::String(stored), spec);

        let envelope = kvs.get_string(&id.kvs_key(Some("J"))).unwrap();
        let unwrapped = sign::unwrap_none(&envelope).unwrap();
        assert_eq!(unwrapped.userid, OWNER);

        let eventlog = kvs.get_string(&id.kvs_key(Some("eventlog"))).unwrap();
        let event: Value = serde_json::from_str(eventlog.trim_end()).unwrap();
        assert_eq!(event["name"], "submit");
        assert_eq!(event["context"]["userid"], OWNER);
        assert_eq!(event["context"]["priority"], 20);

        let entry = lookup_job(&h, id).await.unwrap();
        assert_eq!(entry.userid, OWNER);
        assert_eq!(entry.priority.get(), 20);
        assert!(entry.t_submit > 0.0);
    }

    #[tokio::test]
    async fn priority_outside_range_is_rejected() {
        let inst = instance().await;
        let h = inst.owner();
        let envelope = sign::wrap_none(jobspec::yaml_to_json(BASIC_YAML).unwrap().as_bytes(), OWNER);

        let err = h
            .rpc(
                wire::INGEST_SUBMIT,
                json!({ "J": envelope, "priority": 32, "flags": 0 }),
            )
            .unwrap()
            .get()
            .await
            .unwrap_err();
        assert_eq!(err.errnum(), Errno::EINVAL);
        assert_eq!(err.errstr(), Some("priority range is [0:31]"));
    }

    #[tokio::test]
    async fn unknown_wire_flags_are_protocol_errors() {
        let inst = instance().await;
        let h = inst.owner();
        let envelope = sign::wrap_none(b"{}", OWNER);

        let err = h
            .rpc(
                wire::INGEST_SUBMIT,
                json!({ "J": envelope, "priority": 16, "flags": 0x100 }),
            )
            .unwrap()
            .get()
            .await
            .unwrap_err();
        assert_eq!(err.errnum(), Errno::EPROTO);

        let err = h
            .rpc(wire::INGEST_SUBMIT, json!({ "priority": 16 }))
            .unwrap()
            .get()
            .await
            .unwrap_err();
        assert_eq!(err.errnum(), Errno::EPROTO);
    }

    #[tokio::test]
    async fn signer_must_match_requestor() {
        let inst = instance().await;
        let h = inst.owner();
        let envelope = sign::wrap_none(jobspec::yaml_to_json(BASIC_YAML).unwrap().as_bytes(), 42);

        let err = submit(
            Some(&h),
            Some(&Value::String(envelope)),
            SubmitOptions::default().with_flags(SubmitFlags::PRE_SIGNED),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), format!("signer=42 != requestor={OWNER}"));
        assert_eq!(rpc_errno(err), Errno::EPERM);
    }

    #[tokio::test]
    async fn garbage_envelope_cannot_be_unwrapped() {
        let inst = instance().await;
        let h = inst.owner();

        let err = submit(
            Some(&h),
            Some(&json!("not-an-envelope")),
            SubmitOptions::default().with_flags(SubmitFlags::PRE_SIGNED),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "could not unwrap jobspec");
        assert_eq!(rpc_errno(err), Errno::EINVAL);
    }

    #[tokio::test]
    async fn guest_restrictions() {
        let inst = instance().await;
        let guest = inst.connect(Cred::user(5000));
        let spec = encoded(BASIC_YAML);

        let err = submit(Some(&guest), Some(&spec), SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "only instance owner can use sign-type=none");
        assert_eq!(rpc_errno(err), Errno::EPERM);

        let err = submit(
            Some(&guest),
            Some(&spec),
            SubmitOptions::default().with_priority(Priority::new(17).unwrap()),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("only the instance owner can submit with priority >{}", Priority::DEFAULT)
        );
        assert_eq!(rpc_errno(err), Errno::EINVAL);

        let err = submit(
            Some(&guest),
            Some(&spec),
            SubmitOptions::default().with_flags(SubmitFlags::WAITABLE),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "only the instance owner can submit with FLUX_JOB_WAITABLE"
        );
        assert_eq!(rpc_errno(err), Errno::EINVAL);
        assert!(inst.jobs().is_empty());
    }

    #[tokio::test]
    async fn invalid_jobspecs_are_rejected() {
        let inst = instance().await;
        let h = inst.owner();

        for (name, yaml, msg) in [
            (
                "version_2",
                include_str!("../testdata/jobspec/invalid/version_2.yaml"),
                "unsupported version 2",
            ),
            (
                "no_tasks",
                include_str!("../testdata/jobspec/invalid/no_tasks.yaml"),
                "missing required key 'tasks'",
            ),
            (
                "empty_command",
                include_str!("../testdata/jobspec/invalid/empty_command.yaml"),
                "task 'command' must be a non-empty list of strings",
            ),
        ] {
            let err = submit(Some(&h), Some(&encoded(yaml)), SubmitOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), msg, "{name}");
            assert_eq!(rpc_errno(err), Errno::EINVAL, "{name}");
        }

        let id = submit(
            Some(&h),
            Some(&encoded(include_str!("../testdata/jobspec/valid/use_case_2.1.yaml"))),
            SubmitOptions::default(),
        )
        .await
        .unwrap();
        assert!(id.is_valid());
        assert!(inst.kvs().get(&id.kvs_key(Some("jobspec"))).is_some());
    }

    #[tokio::test]
    async fn shutdown_refuses_new_jobs() {
        let inst = instance().await;
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let guest = inst.connect(Cred::user(5000));
        let err = guest
            .rpc(wire::INGEST_SHUTDOWN, json!({}))
            .unwrap()
            .get()
            .await
            .unwrap_err();
        assert_eq!(err.errnum(), Errno::EPERM);

        h.rpc(wire::INGEST_SHUTDOWN, json!({}))
            .unwrap()
            .get()
            .await
            .unwrap();

        let err = submit(Some(&h), Some(&spec), SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(rpc_errno(err), Errno::ENOSYS);
    }

    #[tokio::test]
    async fn getinfo_reports_generator_timestamp() {
        let inst = instance().await;
        let h = inst.owner();

        let id = submit(Some(&h), Some(&encoded(BASIC_YAML)), SubmitOptions::default())
            .await
            .unwrap();
        let info: IngestInfo = h
            .rpc(wire::INGEST_GETINFO, json!({}))
            .unwrap()
            .get_unpack()
            .await
            .unwrap();
        assert!(info.timestamp >= id.timestamp());
    }

    #[tokio::test]
    async fn manager_priority_list_and_lookup() {
        let inst = instance().await;
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let a = submit(Some(&h), Some(&spec), SubmitOptions::default()).await.unwrap();
        let b = submit(Some(&h), Some(&spec), SubmitOptions::default()).await.unwrap();

        set_priority(Some(&h), a, 3).await.unwrap();
        assert_eq!(lookup_job(&h, a).await.unwrap().priority.get(), 3);

        let err = set_priority(Some(&h), a, 40).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let guest = inst.connect(Cred::user(5000));
        let err = set_priority(Some(&guest), a, 1).await.unwrap_err();
        assert_eq!(rpc_errno(err), Errno::EPERM);

        let missing = JobId::from_parts(1, 0, 0);
        let err = lookup_job(&h, missing).await.unwrap_err();
        assert_eq!(rpc_errno(err), Errno::ENOENT);

        let jobs = list_jobs(&h, &JobQuery::new()).await.unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![b, a]);

        let jobs = list_jobs(&h, &JobQuery::new().with_userid(5000)).await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn list_rpc_caps_requested_entries() {
        let inst = instance().await;
        let h = inst.owner();

        let entries: Vec<JobEntry> = (1..=1500)
            .map(|n| JobEntry {
                id: JobId::new(n),
                userid: OWNER,
                priority: Priority::default(),
                t_submit: 0.0,
                flags: SubmitFlags::empty(),
            })
            .collect();
        inst.jobs().insert_batch(&entries).unwrap();

        let resp: ListResponse = h
            .rpc(wire::MANAGER_LIST, json!({ "max_entries": 5000 }))
            .unwrap()
            .get_unpack()
            .await
            .unwrap();
        assert_eq!(resp.jobs.len(), JobQuery::MAX_ENTRIES);
        assert_eq!(resp.jobs[0].id, JobId::new(1500));

        let resp: ListResponse = h
            .rpc(wire::MANAGER_LIST, json!({}))
            .unwrap()
            .get_unpack()
            .await
            .unwrap();
        assert_eq!(resp.jobs.len(), JobQuery::DEFAULT_ENTRIES);
    }

    #[tokio::test]
    async fn stopped_instance_disconnects_clients() {
        let inst = instance().await;
        let h = inst.owner();
        inst.stop();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let err = submit(Some(&h), Some(&encoded(BASIC_YAML)), SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(rpc_errno(err), Errno::ECONNRESET);
    }

    #[derive(Default)]
    struct CountingMetrics {
        accepted: AtomicUsize,
        rejected: Mutex<Vec<Errno>>,
        batches: Mutex<Vec<(usize, bool)>>,
    }

    impl IngestMetrics for CountingMetrics {
        fn job_accepted(&self) {
            self.accepted.fetch_add(1, Ordering::SeqCst);
        }

        fn job_rejected(&self, errnum: Errno) {
            self.rejected.lock().unwrap().push(errnum);
        }

        fn batch_flushed(&self, jobs: usize, announced: bool) {
            self.batches.lock().unwrap().push((jobs, announced));
        }
    }

    #[tokio::test]
    async fn metrics_observe_ingest() {
        let metrics = Arc::new(CountingMetrics::default());
        let inst = Instance::builder(InstanceConfig {
            owner_userid: OWNER,
            ..Default::default()
        })
        .with_metrics(metrics.clone())
        .start()
        .await
        .unwrap();
        let h = inst.owner();
        let spec = encoded(BASIC_YAML);

        let first = submit_async(Some(&h), Some(&spec), SubmitOptions::default()).unwrap();
        let second = submit_async(Some(&h), Some(&spec), SubmitOptions::default()).unwrap();
        first.get_id().await.unwrap();
        second.get_id().await.unwrap();

        let guest = inst.connect(Cred::user(5000));
        submit(Some(&guest), Some(&spec), SubmitOptions::default())
            .await
            .unwrap_err();

        assert_eq!(metrics.accepted.load(Ordering::SeqCst), 2);
        assert_eq!(*metrics.rejected.lock().unwrap(), vec![Errno::EPERM]);
        assert_eq!(*metrics.batches.lock().unwrap(), vec![(2, true)]);
    }

    /// Job manager that knows no jobs and refuses every announcement.
    struct RefusingManager;

    #[async_trait]
    impl Service for RefusingManager {
        fn name(&self) -> &'static str {
            "job-manager"
        }

        async fn handle(&self, method: &str, req: Request) {
            match method {
                "getinfo" => req.respond_pack(&ManagerInfo {
                    max_jobid: JobId::new(0),
                }),
                _ => req.respond_error(Errno::EEXIST, Some("announce refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn failed_announce_reaches_every_requestor_and_cleans_up() {
        let broker = Broker::new();
        broker.register(Arc::new(RefusingManager)).unwrap();

        let kvs = Kvs::new();
        let owner = broker.connect(Cred::owner(OWNER));
        let ingest = IngestService::load(
            Arc::new(owner.clone()),
            kvs.clone(),
            IngestConfig::default(),
            Arc::new(BasicValidator),
            Arc::new(NoopMetrics),
        )
        .await
        .unwrap();
        broker.register(Arc::new(ingest)).unwrap();

        let spec = encoded(BASIC_YAML);
        let pending: Vec<_> = (0..3)
            .map(|_| submit_async(Some(&owner), Some(&spec), SubmitOptions::default()).unwrap())
            .collect();

        for p in pending {
            let err = p.get_id().await.unwrap_err();
            assert_eq!(err.to_string(), "announce refused");
            assert_eq!(rpc_errno(err), Errno::EEXIST);
        }
        assert!(kvs.is_empty());
    }

    #[tokio::test]
    async fn ingest_requires_job_manager() {
        let broker = Broker::new();
        let result = IngestService::load(
            Arc::new(broker.connect(Cred::owner(OWNER))),
            Kvs::new(),
            IngestConfig::default(),
            Arc::new(BasicValidator),
            Arc::new(NoopMetrics),
        )
        .await;
        assert!(matches!(result, Err(IngestError::ManagerNotLoaded)));
    }
}
