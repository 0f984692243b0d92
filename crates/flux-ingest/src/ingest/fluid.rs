use std::time::Instant;

use flux_model::JobId;

use crate::error::IngestError;

/// Generator of locally unique, increasing job ids.
///
/// Timestamps are milliseconds counted from `start`, a value chosen by the caller so that ids
/// keep increasing across restarts. If more than 1024 ids are requested within one millisecond
/// the generator borrows from the next one instead of waiting.
#[derive(Debug)]
pub struct FluidGenerator {
    id: u16,
    start: u64,
    clock: Instant,
    last: u64,
    seq: u16,
}

impl FluidGenerator {
    pub fn new(id: u16, start: u64) -> Result<Self, IngestError> {
        if id > JobId::MAX_GENERATOR {
            return Err(IngestError::GeneratorId(id));
        }
        if start > JobId::MAX_TIMESTAMP {
            return Err(IngestError::TimestampOverflow);
        }
        Ok(Self {
            id,
            start,
            clock: Instant::now(),
            last: 0,
            seq: 0,
        })
    }

    /// Current timestamp, for handing over to another generator.
    pub fn timestamp(&self) -> Result<u64, IngestError> {
        let now = self.now().max(self.last);
        if now > JobId::MAX_TIMESTAMP {
            return Err(IngestError::TimestampOverflow);
        }
        Ok(now)
    }

    pub fn generate(&mut self) -> Result<JobId, IngestError> {
        let now = self.now();
        if now > self.last {
            self.last = now;
            self.seq = 0;
        } else if self.seq < JobId::MAX_SEQUENCE {
            self.seq += 1;
        } else {
            self.last += 1;
            self.seq = 0;
        }

        if self.last > JobId::MAX_TIMESTAMP {
            return Err(IngestError::TimestampOverflow);
        }
        Ok(JobId::from_parts(self.last, self.id, self.seq))
    }

    fn now(&self) -> u64 {
        self.start
            .saturating_add(self.clock.elapsed().as_millis() as u64)
    }
}
