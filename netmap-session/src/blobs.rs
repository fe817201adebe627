//! Opaque sticky blobs: `DnsConfig`, `SshPolicy`, `PacketFilterRules`,
//! `TkaInfo`, `Health`, `Domain`, `AuditLogId`. Their internal structure is
//! owned by external collaborators (the DNS/filter/TKA subsystems, §1); the
//! session only stores, replaces, and (for the packet filter and TKA head)
//! compiles them.

/// DNS configuration. The only field the session itself inspects is
/// `proxied`, which the force-proxy-dns DevKnob can override (§4.6).
/// Its documented initial value is the empty/default structure (§3),
/// unlike every other sticky field, which starts absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DnsConfig {
    pub proxied: bool,
    pub resolvers: Vec<String>,
    pub domains: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SshPolicy {
    pub rules: Vec<String>,
}

/// Raw, not-yet-compiled packet-filter rules, as carried on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawPacketFilterRules {
    pub rules: Vec<String>,
}

/// Parsed filter matches, produced by the external filter compiler (§6).
/// Opaque beyond being comparable, so sticky-field tests can assert it was
/// left unchanged on a compile failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketFilterRules {
    pub compiled: Vec<String>,
}

/// Raw `tka_head` as carried on the wire; may fail to parse (§3, §7).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TkaHead(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TkaInfo {
    pub disabled: bool,
    pub head: TkaHead,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Health {
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain(pub String);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuditLogId(pub u64);

/// Parses `head` into a well-formed TKA head. A real implementation would
/// validate the chain-of-authority encoding; here an empty string is the
/// only malformed case, giving §3's "a malformed `tka_head` demotes
/// `tka_enabled` to false" something concrete to exercise.
pub fn parse_tka_head(head: &TkaHead) -> Result<(), ()> {
    if head.0.is_empty() {
        Err(())
    } else {
        Ok(())
    }
}

/// Compiles raw filter rules into [`PacketFilterRules`]. Failure is logged
/// by the caller and the sticky field is left at its prior value (§7
/// `ParseFailure`). A rule is considered malformed here if it is empty,
/// which is enough to exercise the failure path without modeling a real
/// filter grammar (out of scope, §1).
pub fn compile_packet_filter(raw: &RawPacketFilterRules) -> Result<PacketFilterRules, ()> {
    if raw.rules.iter().any(|rule| rule.is_empty()) {
        return Err(());
    }
    Ok(PacketFilterRules {
        compiled: raw.rules.clone(),
    })
}
