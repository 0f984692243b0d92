use std::fmt;

use serde::{Deserialize, Serialize};

const SEQ_BITS: u32 = 10;
const ID_BITS: u32 = 14;
const TS_SHIFT: u32 = SEQ_BITS + ID_BITS;

/// Identifier assigned by the coordinator to an accepted job.
///
/// Values are 64-bit FLUIDs: a 40-bit millisecond timestamp, a 14-bit generator id and a 10-bit sequence number,
/// packed most significant first. A valid id is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Largest generator id that fits in the id field.
    pub const MAX_GENERATOR: u16 = (1 << ID_BITS) - 1;
    /// Largest sequence number within one millisecond.
    pub const MAX_SEQUENCE: u16 = (1 << SEQ_BITS) - 1;
    /// Largest representable timestamp.
    pub const MAX_TIMESTAMP: u64 = (1 << (64 - TS_SHIFT)) - 1;

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Pack the three FLUID fields; out-of-range fields are masked.
    pub const fn from_parts(timestamp: u64, generator: u16, sequence: u16) -> Self {
        let ts = timestamp & Self::MAX_TIMESTAMP;
        let id = (generator & Self::MAX_GENERATOR) as u64;
        let seq = (sequence & Self::MAX_SEQUENCE) as u64;
        Self((ts << TS_SHIFT) | (id << SEQ_BITS) | seq)
    }

    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }

    /// Millisecond timestamp field.
    #[inline]
    pub const fn timestamp(&self) -> u64 {
        self.0 >> TS_SHIFT
    }

    #[inline]
    pub const fn generator(&self) -> u16 {
        ((self.0 >> SEQ_BITS) as u16) & Self::MAX_GENERATOR
    }

    #[inline]
    pub const fn sequence(&self) -> u16 {
        (self.0 as u16) & Self::MAX_SEQUENCE
    }

    /// Four 16-bit hex groups, e.g. `0000.0004.b200.0000`.
    pub fn dothex(&self) -> String {
        format!(
            "{:04x}.{:04x}.{:04x}.{:04x}",
            (self.0 >> 48) & 0xffff,
            (self.0 >> 32) & 0xffff,
            (self.0 >> 16) & 0xffff,
            self.0 & 0xffff
        )
    }

    /// Key of the job's KVS directory, or of `name` inside it.
    pub fn kvs_key(&self, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("job.{}.{}", self.dothex(), name),
            None => format!("job.{}", self.dothex()),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<JobId> for u64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}
