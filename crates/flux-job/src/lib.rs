//! Client side of job submission.
//!
//! A [`Handle`] is an open connection to the coordinator, owned by the caller. The functions in
//! this crate borrow it, validate their inputs locally and forward requests as two-phase
//! [`Rpc`]s: the request is sent immediately and the response is awaited separately.
//!
//! ```rust,ignore
//! let jobspec = serde_json::Value::String(flux_model::jobspec::yaml_to_json(&yaml)?);
//! let id = flux_job::submit(Some(&handle), Some(&jobspec), SubmitOptions::default()).await?;
//! assert!(id.is_valid());
//! ```

mod error;
pub use error::{JobError, RpcError};

mod handle;
pub use handle::Handle;

mod rpc;
pub use rpc::{Responder, Rpc};

mod submit;
pub use submit::{PendingSubmit, SubmitOptions, submit, submit_async, submit_get_id};

mod manage;
pub use manage::{list_jobs, lookup_job, set_priority};

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    };

    use serde_json::{Value, json};

    use flux_model::{
        Errno, JobId, SubmitFlags, UserId, jobspec, sign,
        wire::{self, SubmitRequest},
    };

    use super::*;

    const BASIC_YAML: &str = r#"
version: 1
resources:
  - type: slot
    count: 1
    label: default
    with:
      - type: core
        count: 1
tasks:
  - command: [ "app" ]
    slot: default
    count:
      per_slot: 1
"#;

    /// Coordinator stand-in that answers every submit with the next id.
    struct MockHandle {
        userid: UserId,
        next: AtomicU64,
        calls: AtomicUsize,
        last: Mutex<Option<(String, Value)>>,
        fail_with: Option<RpcError>,
    }

    impl MockHandle {
        fn new() -> Self {
            Self {
                userid: 1000,
                next: AtomicU64::new(1 << 24),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                fail_with: None,
            }
        }

        fn failing(err: RpcError) -> Self {
            Self {
                fail_with: Some(err),
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> (String, Value) {
            self.last.lock().unwrap().clone().expect("no request sent")
        }
    }

    impl Handle for MockHandle {
        fn rpc(&self, topic: &str, payload: Value) -> Result<Rpc, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((topic.to_string(), payload));

            let (responder, rpc) = Rpc::channel(topic);
            match &self.fail_with {
                Some(err) => responder.send(Err(err.clone())),
                None if topic == wire::INGEST_SUBMIT => {
                    let id = self.next.fetch_add(1, Ordering::SeqCst);
                    responder.respond(json!({ "id": id }));
                }
                None => responder.respond(json!({})),
            }
            Ok(rpc)
        }

        fn userid(&self) -> UserId {
            self.userid
        }
    }

    fn basic_jobspec() -> Value {
        Value::String(jobspec::yaml_to_json(BASIC_YAML).unwrap())
    }

    #[tokio::test]
    async fn null_handle_is_invalid_argument() {
        let spec = basic_jobspec();

        let err = submit::<MockHandle>(None, Some(&spec), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.errno(), Some(Errno::EINVAL));

        let err = submit_async::<MockHandle>(None, Some(&spec), SubmitOptions::default()).unwrap_err();
        assert_eq!(err.errno(), Some(Errno::EINVAL));
    }

    #[tokio::test]
    async fn null_pending_is_invalid_argument() {
        let err = submit_get_id(None).await.unwrap_err();
        assert_eq!(err.errno(), Some(Errno::EINVAL));
    }

    #[tokio::test]
    async fn null_jobspec_is_invalid_argument_without_rpc() {
        let h = MockHandle::new();

        let err = submit(Some(&h), None, SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = submit(Some(&h), Some(&Value::Null), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(h.calls(), 0);
    }

    #[tokio::test]
    async fn structured_jobspec_is_type_mismatch() {
        let h = MockHandle::new();

        let err = submit(Some(&h), Some(&json!(0)), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(err.errno(), None);

        let doc: Value = jobspec::decode(basic_jobspec().as_str().unwrap().as_bytes()).unwrap();
        let err = submit(Some(&h), Some(&doc), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::TypeMismatch("object")));
        assert_eq!(h.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_flags_rejected_locally() {
        let h = MockHandle::new();
        let opts = SubmitOptions::default().with_flags(SubmitFlags::from_bits(0x100));

        let err = submit(Some(&h), Some(&basic_jobspec()), opts)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(h.calls(), 0);
    }

    #[tokio::test]
    async fn valid_submit_returns_positive_id() {
        let h = MockHandle::new();

        let id = submit(Some(&h), Some(&basic_jobspec()), SubmitOptions::default())
            .await
            .unwrap();
        assert!(id.as_u64() > 0);
        assert_eq!(h.calls(), 1);
    }

    #[tokio::test]
    async fn repeated_submit_yields_distinct_ids() {
        let h = MockHandle::new();
        let spec = basic_jobspec();

        let a = submit(Some(&h), Some(&spec), SubmitOptions::default())
            .await
            .unwrap();
        let b = submit(Some(&h), Some(&spec), SubmitOptions::default())
            .await
            .unwrap();
        assert!(a.is_valid() && b.is_valid());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn two_phase_submit() {
        let h = MockHandle::new();

        let pending = submit_async(Some(&h), Some(&basic_jobspec()), SubmitOptions::default()).unwrap();
        assert_eq!(h.calls(), 1);

        let id = submit_get_id(Some(pending)).await.unwrap();
        assert!(id.is_valid());
    }

    #[tokio::test]
    async fn request_carries_signed_jobspec() {
        let h = MockHandle::new();
        let spec = basic_jobspec();

        submit(Some(&h), Some(&spec), SubmitOptions::default())
            .await
            .unwrap();

        let (topic, payload) = h.last_request();
        assert_eq!(topic, wire::INGEST_SUBMIT);

        let req: SubmitRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(req.priority.get(), 16);
        assert_eq!(req.flags, SubmitFlags::empty());

        let unwrapped = sign::unwrap_none(&req.j).unwrap();
        assert_eq!(unwrapped.userid, 1000);
        assert_eq!(unwrapped.payload, spec.as_str().unwrap().as_bytes());
    }

    #[tokio::test]
    async fn pre_signed_is_sent_verbatim_and_stripped() {
        let h = MockHandle::new();
        let envelope = sign::wrap_none(b"{\"version\":1}", 1000);
        let opts = SubmitOptions::default()
            .with_flags(SubmitFlags::PRE_SIGNED.union(SubmitFlags::DEBUG));

        submit(Some(&h), Some(&Value::String(envelope.clone())), opts)
            .await
            .unwrap();

        let (_, payload) = h.last_request();
        let req: SubmitRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(req.j, envelope);
        assert_eq!(req.flags, SubmitFlags::DEBUG);
    }

    #[tokio::test]
    async fn coordinator_errors_pass_through() {
        let h = MockHandle::failing(RpcError::new(
            Errno::EPERM,
            Some("only instance owner can use sign-type=none".into()),
        ));

        let err = submit(Some(&h), Some(&basic_jobspec()), SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.errno(), Some(Errno::EPERM));
        assert_eq!(err.to_string(), "only instance owner can use sign-type=none");
    }

    #[tokio::test]
    async fn set_priority_validates_locally() {
        let h = MockHandle::new();

        let err = set_priority::<MockHandle>(None, JobId::new(1 << 24), 5)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = set_priority(Some(&h), JobId::new(1 << 24), 40)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = set_priority(Some(&h), JobId::new(0), 5).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(h.calls(), 0);

        set_priority(Some(&h), JobId::new(1 << 24), 5).await.unwrap();
        let (topic, payload) = h.last_request();
        assert_eq!(topic, wire::MANAGER_PRIORITY);
        assert_eq!(payload["priority"], 5);
    }
}
