//! Peer and self-node records.
//!
//! Shaped after `zebra-network`'s `MetaAddr` (`meta_addr.rs`): a plain data
//! struct addressed by one key field, with explicit constructors instead of
//! a builder, and a `patch`-style method that applies only the fields a
//! caller actually provides rather than requiring a full replacement.

use chrono::{DateTime, Utc};

use crate::ids::{NodeId, UserId};
use crate::keys::{DiscoKey, KeyExpiry, KeySignature, NodeKey};

/// Canonical magic-address-plus-region encoding of a DERP home relay.
///
/// Region `0` means "no DERP home assigned" and is distinct from "unset" in
/// a patch (see [`crate::peer_merge`]'s handling of `derp_region == 0`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerpAddr {
    pub region: i32,
}

impl DerpAddr {
    pub fn for_region(region: i32) -> Self {
        DerpAddr { region }
    }
}

/// A peer record. Nodes are addressed by `id`; the session's stored list is
/// always strictly ascending by `id`, with no duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub endpoints: Vec<String>,
    pub derp: Option<DerpAddr>,
    pub cap: i64,
    pub capabilities: Vec<String>,
    pub key: NodeKey,
    pub disco_key: DiscoKey,
    pub online: Option<bool>,
    pub last_seen: Option<DateTime<Utc>>,
    pub key_expiry: KeyExpiry,
    pub key_signature: KeySignature,
    pub sharer: UserId,
    pub user: UserId,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Node {
            id,
            ..Default::default()
        }
    }

    /// A defensive deep clone, used when the session stashes the merged
    /// peer list as the basis for the next delta (§9 "Defensive
    /// deep-cloning of peers"). `Node` holds no shared/interior-mutable
    /// state, so a plain `Clone` already satisfies this.
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }
}

/// A per-field patch against an existing [`Node`], as carried by
/// `peers_changed_patch` (§4.1 step 3). Every field is optional; absent
/// means "leave unchanged". `derp_region == Some(0)` is defined by the
/// source to mean "no change" rather than "clear the DERP home" — see
/// Open Question (a) in §9.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePatch {
    pub node_id: NodeId,
    pub derp_region: Option<i32>,
    pub cap: Option<i64>,
    pub endpoints: Option<Vec<String>>,
    pub key: Option<NodeKey>,
    pub disco_key: Option<DiscoKey>,
    pub key_expiry: Option<KeyExpiry>,
    pub capabilities: Option<Vec<String>>,
    pub key_signature: Option<KeySignature>,
    pub online: Option<Option<bool>>,
    pub last_seen: Option<Option<DateTime<Utc>>>,
}

impl NodePatch {
    pub fn new(node_id: NodeId) -> Self {
        NodePatch {
            node_id,
            ..Default::default()
        }
    }

    /// Apply this patch to `node` in place, per §4.1 step 3. `cap == 0` and
    /// `derp_region == 0` are treated as "no change", mirroring the
    /// source's convention that these fields use `0` as their absent
    /// sentinel rather than `Option`.
    pub fn apply(&self, node: &mut Node) {
        if let Some(region) = self.derp_region {
            if region != 0 {
                node.derp = Some(DerpAddr::for_region(region));
            }
        }
        if let Some(cap) = self.cap {
            if cap != 0 {
                node.cap = cap;
            }
        }
        if let Some(endpoints) = &self.endpoints {
            node.endpoints = endpoints.clone();
        }
        if let Some(key) = &self.key {
            node.key = key.clone();
        }
        if let Some(disco_key) = &self.disco_key {
            node.disco_key = disco_key.clone();
        }
        if let Some(key_expiry) = &self.key_expiry {
            node.key_expiry = *key_expiry;
        }
        if let Some(capabilities) = &self.capabilities {
            node.capabilities = capabilities.clone();
        }
        if let Some(key_signature) = &self.key_signature {
            node.key_signature = key_signature.clone();
        }
        if let Some(online) = &self.online {
            node.online = *online;
        }
        if let Some(last_seen) = &self.last_seen {
            node.last_seen = *last_seen;
        }
    }
}

/// Machine authentication state, distinct from the per-node online/auth
/// bits because it is only meaningful for the local machine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MachineStatus {
    #[default]
    Unknown,
    Authorized,
    NeedsLogin,
    NeedsMachineAuth,
}

/// The local node's record: same shape as [`Node`] plus fields that are
/// only meaningful for the machine the session is running on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelfNode {
    pub node: Node,
    pub machine_status: MachineStatus,
    pub addresses: Vec<String>,
    pub hostinfo: Option<String>,
    pub name: String,
    pub expiry: KeyExpiry,
}

impl SelfNode {
    pub fn new(id: NodeId) -> Self {
        SelfNode {
            node: Node::new(id),
            ..Default::default()
        }
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn user(&self) -> UserId {
        self.node.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_leaves_zero_derp_region_unchanged() {
        let mut node = Node::new(NodeId(1));
        node.derp = Some(DerpAddr::for_region(7));

        let mut patch = NodePatch::new(NodeId(1));
        patch.derp_region = Some(0);
        patch.apply(&mut node);

        assert_eq!(node.derp, Some(DerpAddr::for_region(7)));
    }

    #[test]
    fn patch_rewrites_nonzero_derp_region() {
        let mut node = Node::new(NodeId(1));
        let mut patch = NodePatch::new(NodeId(1));
        patch.derp_region = Some(9);
        patch.apply(&mut node);

        assert_eq!(node.derp, Some(DerpAddr::for_region(9)));
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut node = Node::new(NodeId(1));
        node.cap = 3;
        node.online = Some(false);

        let mut patch = NodePatch::new(NodeId(1));
        patch.online = Some(Some(true));
        patch.apply(&mut node);

        assert_eq!(node.cap, 3, "cap should be untouched");
        assert_eq!(node.online, Some(true));
    }
}
