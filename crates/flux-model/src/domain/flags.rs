use serde::{Deserialize, Serialize};

/// Submission flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitFlags(u32);

impl SubmitFlags {
    /// Jobspec is already a signed envelope. Client side only, never sent.
    pub const PRE_SIGNED: SubmitFlags = SubmitFlags(1);
    /// Coordinator should emit extra debug events for the job.
    pub const DEBUG: SubmitFlags = SubmitFlags(2);
    /// Job may be waited on. Owner only.
    pub const WAITABLE: SubmitFlags = SubmitFlags(4);

    /// Flags the client accepts.
    pub const CLIENT_MASK: u32 = Self::PRE_SIGNED.0 | Self::DEBUG.0 | Self::WAITABLE.0;
    /// Flags the coordinator accepts on the wire.
    pub const WIRE_MASK: u32 = Self::DEBUG.0 | Self::WAITABLE.0;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, other: SubmitFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn within(&self, mask: u32) -> bool {
        self.0 & !mask == 0
    }

    pub const fn union(self, other: SubmitFlags) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn without(self, other: SubmitFlags) -> Self {
        Self(self.0 & !other.0)
    }
}
