//! The wire-ish `Update` object the session consumes and discards (§3).
//!
//! Deserializing this from the actual long-poll wire format is an external
//! collaborator's job (§1); this crate only defines the in-memory shape
//! `PeerMerge`/`StickyState`/`Session` operate on.

use std::collections::HashMap;

use crate::blobs::{AuditLogId, Domain, Health, RawPacketFilterRules, SshPolicy, TkaInfo};
use crate::derp::DerpMap;
use crate::ids::NodeId;
use crate::node::{Node, NodePatch, SelfNode};
use crate::user::UserProfile;

/// Opaque debug sub-message, dispatched to `on_debug` before anything else
/// in an update is processed (§4.4.1 step 1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugMessage {
    pub kind: String,
    pub payload: Vec<u8>,
}

/// One incremental or full update from the control plane.
///
/// Every field is optional; absence has the sticky meaning described next
/// to each field below, except `peers`/`peers_removed`/`peers_changed`,
/// which describe a one-shot delta against the previous peer list rather
/// than a sticky value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Update {
    /// Non-sticky: replaces the self-node for this update only; absent
    /// means "reuse the last-observed self-node".
    pub self_node: Option<SelfNode>,

    /// Full peer-list replacement. When present and non-empty, takes
    /// precedence over `peers_removed`/`peers_changed` (§4.1 step 1).
    pub peers: Vec<Node>,

    /// Delta: ids to drop from the previous peer list.
    pub peers_removed: Vec<NodeId>,

    /// Delta: nodes that replace (not merge with) the entry for their id
    /// in the previous peer list, or are inserted if no such entry exists.
    pub peers_changed: Vec<Node>,

    /// Field-level patches, applied after the delta merge (§4.1 step 3).
    pub peers_changed_patch: Vec<NodePatch>,

    /// `last_seen` liveness deltas: `true` sets it to "now", `false` clears
    /// it. Unknown ids are ignored.
    pub peer_seen_change: HashMap<NodeId, bool>,

    /// `online` liveness deltas. Unknown ids are ignored.
    pub online_change: HashMap<NodeId, bool>,

    /// Sticky: DERP region map, itself sticky-merged at the sub-field level
    /// (§4.2).
    pub derp_map: Option<DerpMap>,

    /// Sticky.
    pub dns_config: Option<crate::blobs::DnsConfig>,
    /// Sticky.
    pub ssh_policy: Option<SshPolicy>,
    /// Sticky (raw; compiled by the external filter compiler before being
    /// stored, §6).
    pub packet_filter_rules: Option<RawPacketFilterRules>,
    /// Sticky.
    pub tka_info: Option<TkaInfo>,
    /// Sticky.
    pub health: Option<Health>,
    /// Sticky.
    pub domain: Option<Domain>,
    /// Sticky.
    pub audit_log_id: Option<AuditLogId>,
    /// Sticky optional-bool: unset means "unchanged" (§4.2).
    pub collect_services: Option<bool>,

    /// New user profiles delivered this update. Accumulated into sticky
    /// state; never evicted (§4.2, Open Question (c)).
    pub user_profiles: Vec<UserProfile>,

    /// Opaque debug sub-message (§4.4.1 step 1).
    pub debug: Option<DebugMessage>,
}

impl Update {
    pub fn new() -> Self {
        Update::default()
    }

    /// Whether this update carries a full peer-list replacement (§4.1 step
    /// 1: "non-empty `peers`").
    pub fn has_full_peer_list(&self) -> bool {
        !self.peers.is_empty()
    }

    /// Clears the delta fields once they have been folded into the merged
    /// peer list (§4.1 step 4), so the update object cannot be re-fed into
    /// the session with stale deltas (§9 "In-place mutation of updates").
    pub fn clear_peer_deltas(&mut self) {
        self.peers_changed.clear();
        self.peers_removed.clear();
    }
}
