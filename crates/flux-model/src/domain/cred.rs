use serde::{Deserialize, Serialize};

use super::UserId;

/// Role bits attached to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMask(u32);

impl RoleMask {
    pub const NONE: RoleMask = RoleMask(0);
    pub const OWNER: RoleMask = RoleMask(1);
    pub const USER: RoleMask = RoleMask(2);

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, other: RoleMask) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn union(self, other: RoleMask) -> RoleMask {
        RoleMask(self.0 | other.0)
    }
}

/// Credentials of the peer that sent a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cred {
    pub userid: UserId,
    pub rolemask: RoleMask,
}

impl Cred {
    /// Instance owner, who may do anything.
    pub const fn owner(userid: UserId) -> Self {
        Self {
            userid,
            rolemask: RoleMask::OWNER.union(RoleMask::USER),
        }
    }

    /// Ordinary guest user.
    pub const fn user(userid: UserId) -> Self {
        Self {
            userid,
            rolemask: RoleMask::USER,
        }
    }

    #[inline]
    pub const fn is_owner(&self) -> bool {
        self.rolemask.contains(RoleMask::OWNER)
    }
}
