//! §4.6 DevKnobs: process-wide boolean toggles read from the environment
//! once, at construction, and held for the lifetime of the session —
//! mirroring how `zebra-network::constants` centralizes its tunables as
//! plain values read once rather than threaded through a live config
//! object.

use std::env;

use crate::constants::{ENV_FORCE_PROXY_DNS, ENV_SELF_V6_ONLY, ENV_STRIP_CAPS, ENV_STRIP_ENDPOINTS};
use crate::node::Node;
use crate::update::Update;

fn env_flag(name: &str) -> bool {
    matches!(env::var(name), Ok(v) if v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Snapshot of the environment-driven debug toggles, read once.
#[derive(Copy, Clone, Debug, Default)]
pub struct DevKnobs {
    pub strip_endpoints: bool,
    pub strip_capabilities: bool,
    pub force_proxy_dns: bool,
    pub ipv6_only_self_addresses: bool,
}

impl DevKnobs {
    /// Reads the knobs from the process environment once.
    pub fn from_env() -> Self {
        DevKnobs {
            strip_endpoints: env_flag(ENV_STRIP_ENDPOINTS),
            strip_capabilities: env_flag(ENV_STRIP_CAPS),
            force_proxy_dns: env_flag(ENV_FORCE_PROXY_DNS),
            ipv6_only_self_addresses: env_flag(ENV_SELF_V6_ONLY),
        }
    }

    /// Applies the strip-endpoints knob (§4.6) to every entry in
    /// `update.peers` and `update.peers_changed`, before merge.
    pub fn apply_to_update(&self, update: &mut Update) {
        if self.strip_endpoints {
            for node in update.peers.iter_mut().chain(update.peers_changed.iter_mut()) {
                clear_endpoints(node);
            }
        }
    }

    /// Applies the strip-capabilities knob to the self-node (§4.4.1 step
    /// 3), before it is inspected by the control-knob subsystem.
    pub fn apply_to_self_node(&self, node: &mut Node) {
        if self.strip_capabilities {
            node.capabilities.clear();
        }
    }
}

fn clear_endpoints(node: &mut Node) {
    node.endpoints.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    #[test]
    fn strip_endpoints_clears_full_and_changed_lists() {
        let knobs = DevKnobs {
            strip_endpoints: true,
            ..DevKnobs::default()
        };
        let mut n1 = Node::new(NodeId(1));
        n1.endpoints = vec!["a".into()];
        let mut n2 = Node::new(NodeId(2));
        n2.endpoints = vec!["b".into()];
        let mut update = Update {
            peers: vec![n1],
            peers_changed: vec![n2],
            ..Update::new()
        };

        knobs.apply_to_update(&mut update);

        assert!(update.peers[0].endpoints.is_empty());
        assert!(update.peers_changed[0].endpoints.is_empty());
    }

    #[test]
    fn default_knobs_leave_endpoints_alone() {
        let knobs = DevKnobs::default();
        let mut n1 = Node::new(NodeId(1));
        n1.endpoints = vec!["a".into()];
        let mut update = Update {
            peers: vec![n1],
            ..Update::new()
        };
        knobs.apply_to_update(&mut update);
        assert_eq!(update.peers[0].endpoints, vec!["a".to_string()]);
    }
}
