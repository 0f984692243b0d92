use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use flux_model::{JobEntry, JobId, JobQuery, Priority, UserId};

/// In-memory table of tracked jobs.
#[derive(Clone)]
pub struct JobTable {
    inner: Arc<RwLock<JobTableInner>>,
}

struct JobTableInner {
    /// Jobs ordered by id, which is also submission order.
    jobs: BTreeMap<JobId, JobEntry>,
    /// Index: userid -> ids of that user's jobs.
    by_user: HashMap<UserId, Vec<JobId>>,
    /// Largest id ever inserted.
    max_jobid: JobId,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(JobTableInner {
                jobs: BTreeMap::new(),
                by_user: HashMap::new(),
                max_jobid: JobId::new(0),
            })),
        }
    }

    /// Insert a batch of new jobs, all or nothing.
    ///
    /// Returns the first id that is already tracked, if any.
    pub fn insert_batch(&self, entries: &[JobEntry]) -> Result<(), JobId> {
        let mut inner = self.inner.write().unwrap();

        let mut seen = Vec::with_capacity(entries.len());
        for entry in entries {
            if inner.jobs.contains_key(&entry.id) || seen.contains(&entry.id) {
                return Err(entry.id);
            }
            seen.push(entry.id);
        }

        for entry in entries {
            inner.max_jobid = inner.max_jobid.max(entry.id);
            inner.by_user.entry(entry.userid).or_default().push(entry.id);
            inner.jobs.insert(entry.id, entry.clone());
        }
        Ok(())
    }

    pub fn get(&self, id: JobId) -> Option<JobEntry> {
        let inner = self.inner.read().unwrap();
        inner.jobs.get(&id).cloned()
    }

    /// Update priority; `false` if the job is unknown.
    pub fn set_priority(&self, id: JobId, priority: Priority) -> bool {
        let mut inner = self.inner.write().unwrap();
        match inner.jobs.get_mut(&id) {
            Some(entry) => {
                entry.priority = priority;
                true
            }
            None => false,
        }
    }

    pub fn max_jobid(&self) -> JobId {
        self.inner.read().unwrap().max_jobid
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Jobs matching `q`, newest first, at most `q.limit()` of them.
    pub fn query(&self, q: &JobQuery) -> Vec<JobEntry> {
        let inner = self.inner.read().unwrap();

        let mut ids: Vec<JobId> = match q.userid {
            Some(userid) => inner.by_user.get(&userid).cloned().unwrap_or_default(),
            None => inner.jobs.keys().copied().collect(),
        };
        ids.sort_unstable_by(|a, b| b.cmp(a));

        ids.into_iter()
            .take(q.limit())
            .filter_map(|id| inner.jobs.get(&id).cloned())
            .collect()
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}
