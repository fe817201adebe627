//! §4.2 `NetworkMap` (the output snapshot) and `SnapshotBuilder`.
//!
//! Grounded on `MetaAddr::sanitize` (`meta_addr.rs`): deriving a read-only
//! outward view from internal state, rather than exposing the internal
//! state directly.

use std::collections::HashMap;

use tracing::warn;

use crate::address_filter::filter_self_addresses;
use crate::blobs::{parse_tka_head, AuditLogId, Domain, DnsConfig, Health, PacketFilterRules, SshPolicy};
use crate::clock::Clock;
use crate::derp::DerpMap;
use crate::devknobs::DevKnobs;
use crate::ids::UserId;
use crate::keys::{KeyExpiry, MachinePublicKey, PrivateNodeKey};
use crate::node::{MachineStatus, Node, SelfNode};
use crate::peer_merge::merge_peers;
use crate::sticky::StickyState;
use crate::update::Update;
use crate::user::UserProfile;

/// The fully materialized, immutable snapshot produced per update (§3).
///
/// Once returned from [`SnapshotBuilder::build`] it is never mutated again;
/// `Session` only ever hands out shared references or clones of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkMap {
    pub private_node_key: PrivateNodeKey,
    pub machine_public_key: MachinePublicKey,

    pub peers: Vec<Node>,
    pub user_profiles: HashMap<UserId, UserProfile>,

    pub expiry: KeyExpiry,
    pub name: String,
    pub addresses: Vec<String>,
    pub hostinfo: Option<String>,
    pub machine_status: MachineStatus,

    pub derp_map: Option<DerpMap>,
    pub dns: DnsConfig,
    pub ssh_policy: Option<SshPolicy>,
    pub packet_filter_rules: Option<PacketFilterRules>,
    pub tka_enabled: bool,
    pub health: Option<Health>,
    pub domain: Option<Domain>,
    pub audit_log_id: Option<AuditLogId>,
    pub collect_services: Option<bool>,
}

impl NetworkMap {
    /// A very concise textual summary (§4.4.1 step 6): peer count and
    /// whether a self-node is known. Deliberately terse — this is a
    /// one-line log-friendly description, not a debug dump.
    pub fn concise_summary(&self) -> String {
        format!(
            "netmap: self={} peers={} derp={}",
            if self.name.is_empty() { "?" } else { &self.name },
            self.peers.len(),
            self.derp_map
                .as_ref()
                .and_then(|m| m.home_params.as_ref())
                .is_some(),
        )
    }
}

/// Assembles a [`NetworkMap`] from sticky state, the freshly merged peer
/// list, and the self-node (§4.2).
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Runs §4.1 `PeerMerge` against `prev_peers`, folds the update into
    /// `sticky`, updates `self_node_store` if the update carries one, and
    /// assembles the resulting [`NetworkMap`].
    ///
    /// Returns the snapshot together with the new peer list, which the
    /// caller (`Session`) stashes as the `prev_peers` for the next call.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        prev_peers: Vec<Node>,
        update: &mut Update,
        clock: &dyn Clock,
        sticky: &mut StickyState,
        self_node_store: &mut Option<SelfNode>,
        knobs: &DevKnobs,
        private_node_key: &PrivateNodeKey,
        machine_public_key: &MachinePublicKey,
    ) -> (NetworkMap, Vec<Node>) {
        let merged_peers = merge_peers(prev_peers, update, clock);

        sticky.apply_update(update);

        if let Some(new_self) = update.self_node.take() {
            *self_node_store = Some(new_self);
        }

        let tka_enabled = sticky
            .tka_info
            .as_ref()
            .map(|info| !info.disabled && parse_tka_head(&info.head).is_ok())
            .unwrap_or(false);
        if let Some(info) = &sticky.tka_info {
            if !info.disabled && parse_tka_head(&info.head).is_err() {
                warn!("tka_head failed to parse; forcing tka_enabled=false");
            }
        }

        let mut dns = sticky.dns_config.clone();
        if knobs.force_proxy_dns {
            dns.proxied = true;
        }

        let user_profiles = collect_referenced_profiles(self_node_store.as_ref(), &merged_peers, &sticky.user_profiles);

        let (expiry, name, addresses, hostinfo, machine_status) = match self_node_store.as_ref() {
            Some(self_node) => (
                self_node.expiry,
                self_node.name.clone(),
                filter_self_addresses(self_node.addresses.clone(), knobs.ipv6_only_self_addresses),
                self_node.hostinfo.clone(),
                self_node.machine_status,
            ),
            None => (None, String::new(), Vec::new(), None, MachineStatus::Unknown),
        };

        let snapshot = NetworkMap {
            private_node_key: private_node_key.clone(),
            machine_public_key: machine_public_key.clone(),
            peers: merged_peers.iter().map(Node::deep_clone).collect(),
            user_profiles,
            expiry,
            name,
            addresses,
            hostinfo,
            machine_status,
            derp_map: sticky.derp_map.clone(),
            dns,
            ssh_policy: sticky.ssh_policy.clone(),
            packet_filter_rules: sticky.packet_filter_rules.clone(),
            tka_enabled,
            health: sticky.health.clone(),
            domain: sticky.domain.clone(),
            audit_log_id: sticky.audit_log_id,
            collect_services: sticky.collect_services,
        };

        (snapshot, merged_peers)
    }
}

/// §4.2 `user_profiles`: for each non-zero id referenced by the self-node
/// or any peer (as `user` or `sharer`), copy the known profile into the
/// snapshot mapping. Ids without a known profile are omitted.
fn collect_referenced_profiles(
    self_node: Option<&SelfNode>,
    peers: &[Node],
    known: &HashMap<UserId, UserProfile>,
) -> HashMap<UserId, UserProfile> {
    let mut out = HashMap::new();
    let mut consider = |id: UserId| {
        if !id.is_zero() {
            if let Some(profile) = known.get(&id) {
                out.entry(id).or_insert_with(|| profile.clone());
            }
        }
    };

    if let Some(self_node) = self_node {
        consider(self_node.user());
    }
    for peer in peers {
        consider(peer.user);
        consider(peer.sharer);
    }

    out
}
