//! Opaque, totally-ordered identifiers.
//!
//! Kept deliberately thin: the session never interprets the bits of a
//! [`NodeId`] or [`UserId`], only compares and sorts them, the same way
//! `zebra-network`'s `MetaAddr` treats a `SocketAddr` as an opaque sort key.

use std::fmt;

/// Identifies a peer. The session's stored peer list is always strictly
/// ascending by `NodeId`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Identifies a user profile. `UserId::ZERO` is the sentinel meaning
/// "absent" — it is never looked up in, or inserted into, the user-profile
/// mapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserId(pub i64);

impl UserId {
    pub const ZERO: UserId = UserId(0);

    /// Whether this id is the "absent" sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_user_id_is_sentinel() {
        assert!(UserId::ZERO.is_zero());
        assert!(!UserId(1).is_zero());
    }

    #[test]
    fn node_ids_order_numerically() {
        assert!(NodeId(1) < NodeId(2));
        assert!(NodeId(-1) < NodeId(0));
    }
}
