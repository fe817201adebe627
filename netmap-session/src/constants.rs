//! Tunables shared across the crate, collected in one place the way
//! `zebra-network::constants` groups its magic numbers rather than threading
//! them through a config struct.

use std::time::Duration;

/// How long the watchdog waits for activity before invoking the session's
/// cancel hook. Reset on every non-keepalive update and on any `on_debug`
/// callback that sends on the watchdog-reset sink.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(120);

/// Clears `endpoints` on every incoming peer before merge.
pub const ENV_STRIP_ENDPOINTS: &str = "TS_DEBUG_STRIP_ENDPOINTS";

/// Clears the self-node's `capabilities` before the control-knob subsystem
/// inspects them.
pub const ENV_STRIP_CAPS: &str = "TS_DEBUG_STRIP_CAPS";

/// Forces `dns.proxied` to `true` on every assembled snapshot.
pub const ENV_FORCE_PROXY_DNS: &str = "TS_DEBUG_FORCE_PROXY_DNS";

/// Restricts `filter_self_addresses` to IPv6-only addresses.
pub const ENV_SELF_V6_ONLY: &str = "TS_DEBUG_SELF_V6_ONLY";
