//! §4.2 `StickyState`: the session-scoped record of the last-observed
//! value of every sticky field.
//!
//! Grounded on `MetaAddr`'s "take the prior state, produce the new state"
//! method shape (`MetaAddr::sanitize`, `meta_addr.rs`) and on `PeerAddrState`
//! modeling "never observed" as its own explicit enum case rather than a
//! bolted-on flag (§9 "Sticky-field representation").

use std::collections::HashMap;

use tracing::warn;

use crate::blobs::{
    compile_packet_filter, AuditLogId, Domain, DnsConfig, Health, PacketFilterRules, SshPolicy,
    TkaInfo,
};
use crate::derp::DerpMap;
use crate::ids::UserId;
use crate::update::Update;
use crate::user::UserProfile;

/// Last-observed value of every sticky field (§3). `dns_config` is
/// initialized to the empty structure; every other field starts absent,
/// which is why it alone is not an `Option`.
#[derive(Clone, Debug, Default)]
pub struct StickyState {
    pub derp_map: Option<DerpMap>,
    pub dns_config: DnsConfig,
    pub ssh_policy: Option<SshPolicy>,
    pub packet_filter_rules: Option<PacketFilterRules>,
    pub tka_info: Option<TkaInfo>,
    pub health: Option<Health>,
    pub domain: Option<Domain>,
    pub audit_log_id: Option<AuditLogId>,
    pub collect_services: Option<bool>,
    pub user_profiles: HashMap<UserId, UserProfile>,
}

impl StickyState {
    pub fn new() -> Self {
        StickyState::default()
    }

    /// Folds every sticky field present in `update` into the stored state.
    /// Fields absent from `update` are left untouched (§4.2).
    pub fn apply_update(&mut self, update: &Update) {
        if let Some(incoming) = &update.derp_map {
            self.derp_map = Some(DerpMap::merge_sticky(incoming, self.derp_map.as_ref()));
        }
        if let Some(dns_config) = &update.dns_config {
            self.dns_config = dns_config.clone();
        }
        if let Some(ssh_policy) = &update.ssh_policy {
            self.ssh_policy = Some(ssh_policy.clone());
        }
        if let Some(raw) = &update.packet_filter_rules {
            match compile_packet_filter(raw) {
                Ok(compiled) => self.packet_filter_rules = Some(compiled),
                Err(()) => warn!("packet filter rules failed to compile; keeping prior rules"),
            }
        }
        if let Some(tka_info) = &update.tka_info {
            self.tka_info = Some(tka_info.clone());
        }
        if let Some(health) = &update.health {
            self.health = Some(health.clone());
        }
        if let Some(domain) = &update.domain {
            self.domain = Some(domain.clone());
        }
        if let Some(audit_log_id) = &update.audit_log_id {
            self.audit_log_id = Some(*audit_log_id);
        }
        if let Some(collect_services) = update.collect_services {
            self.collect_services = Some(collect_services);
        }
        for profile in &update.user_profiles {
            self.user_profiles.insert(profile.id, profile.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs::TkaHead;

    #[test]
    fn absent_fields_are_untouched() {
        let mut state = StickyState::new();
        state.domain = Some(Domain("example.ts.net".into()));
        state.apply_update(&Update::new());
        assert_eq!(state.domain, Some(Domain("example.ts.net".into())));
    }

    #[test]
    fn dns_config_starts_as_empty_structure() {
        let state = StickyState::new();
        assert_eq!(state.dns_config, DnsConfig::default());
    }

    #[test]
    fn packet_filter_parse_failure_keeps_prior_value() {
        let mut state = StickyState::new();
        state.packet_filter_rules = Some(PacketFilterRules {
            compiled: vec!["accept *".into()],
        });

        let update = Update {
            packet_filter_rules: Some(crate::blobs::RawPacketFilterRules {
                rules: vec!["".into()],
            }),
            ..Update::new()
        };
        state.apply_update(&update);

        assert_eq!(
            state.packet_filter_rules,
            Some(PacketFilterRules {
                compiled: vec!["accept *".into()]
            })
        );
    }

    #[test]
    fn user_profiles_accumulate_and_are_never_evicted() {
        let mut state = StickyState::new();
        state.apply_update(&Update {
            user_profiles: vec![UserProfile {
                id: UserId(1),
                display_name: "alice".into(),
                login_name: "alice@example.com".into(),
            }],
            ..Update::new()
        });
        state.apply_update(&Update::new());
        assert!(state.user_profiles.contains_key(&UserId(1)));
    }

    #[test]
    fn tka_info_stored_verbatim_parsing_deferred_to_snapshot() {
        let mut state = StickyState::new();
        state.apply_update(&Update {
            tka_info: Some(TkaInfo {
                disabled: false,
                head: TkaHead(String::new()),
            }),
            ..Update::new()
        });
        assert!(state.tka_info.is_some());
    }
}
