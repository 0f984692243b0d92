use serde_json::json;

use flux_job::Responder;
use flux_model::{Cred, JobEntry, JobId, Priority, SubmitFlags};

use super::eventlog::EventEntry;
use crate::kvs::Txn;

/// Submission that passed all checks and is waiting for an id.
#[derive(Debug)]
pub(crate) struct Admitted {
    pub envelope: String,
    pub jobspec: Vec<u8>,
    pub cred: Cred,
    pub priority: Priority,
    pub flags: SubmitFlags,
}

/// Jobs collected within one batch window, committed and announced together.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    pub responders: Vec<(JobId, Responder)>,
    pub txn: Txn,
    pub joblist: Vec<JobEntry>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the job's KVS records and job manager entry.
    pub fn add_job(&mut self, id: JobId, job: Admitted, responder: Responder) {
        let event = EventEntry::now(
            "submit",
            json!({
                "userid": job.cred.userid,
                "priority": job.priority,
                "flags": job.flags,
            }),
        );

        self.txn.put(id.kvs_key(Some("J")), job.envelope);
        self.txn.put(id.kvs_key(Some("jobspec")), job.jobspec);
        self.txn.append(id.kvs_key(Some("eventlog")), event.encode());

        self.joblist.push(JobEntry {
            id,
            userid: job.cred.userid,
            priority: job.priority,
            t_submit: event.timestamp,
            flags: job.flags,
        });
        self.responders.push((id, responder));
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    /// Transaction removing everything this batch wrote.
    pub fn cleanup_txn(&self) -> Txn {
        let mut txn = Txn::new();
        for (id, _) in &self.responders {
            txn.unlink(id.kvs_key(None));
        }
        txn
    }
}
