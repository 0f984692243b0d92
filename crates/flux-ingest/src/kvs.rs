//! In-memory key-value store with atomic transactions.
//!
//! Keys are dot-separated paths. Unlinking a key also removes everything below it,
//! so `job.0000.0004.b200.0000` removes the whole job directory.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

#[derive(Debug, Clone)]
enum Op {
    Put { key: String, value: Vec<u8> },
    Append { key: String, value: Vec<u8> },
    Unlink { key: String },
}

/// Ordered list of operations applied together by [`Kvs::commit`].
#[derive(Debug, Clone, Default)]
pub struct Txn {
    ops: Vec<Op>,
}

impl Txn {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.ops.push(Op::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Append to an existing value, or create it.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.ops.push(Op::Append {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn unlink(&mut self, key: impl Into<String>) {
        self.ops.push(Op::Unlink { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct Kvs {
    inner: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl Kvs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply all operations of `txn` under one write lock.
    pub fn commit(&self, txn: Txn) {
        let mut inner = self.inner.write().unwrap();

        for op in txn.ops {
            match op {
                Op::Put { key, value } => {
                    inner.insert(key, value);
                }
                Op::Append { key, value } => {
                    inner.entry(key).or_default().extend_from_slice(&value);
                }
                Op::Unlink { key } => {
                    let dir = format!("{key}.");
                    inner.retain(|k, _| k != &key && !k.starts_with(&dir));
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let inner = self.inner.read().unwrap();
        inner.get(key).cloned()
    }

    /// Value as UTF-8 text; `None` if missing or not text.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| String::from_utf8(v).ok())
    }

    /// Keys at or below `dir`, in order.
    pub fn list(&self, dir: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let prefix = format!("{dir}.");
        inner
            .keys()
            .filter(|k| k.as_str() == dir || k.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
