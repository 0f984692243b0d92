use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Requested job priority.
///
/// Guests may only lower priority below the default; the instance owner may use the full range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 31;
    pub const DEFAULT: i32 = 16;

    /// Checked constructor.
    pub fn new(value: i32) -> Result<Self, ModelError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ModelError::PriorityRange(value));
        }
        Ok(Self(value))
    }

    /// Wrap a raw value without range checking; used when decoding requests that are validated later.
    pub const fn from_raw(value: i32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn get(&self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn in_range(&self) -> bool {
        self.0 >= Self::MIN && self.0 <= Self::MAX
    }

    /// Whether a guest is allowed to request this priority.
    #[inline]
    pub const fn guest_allowed(&self) -> bool {
        self.0 <= Self::DEFAULT
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
