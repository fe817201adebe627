//! A session-scoped reconciler for an incremental/full network-map update
//! stream (§1 Purpose & Scope).
//!
//! `Session` is the entry point: construct one per long-poll session,
//! configure the observer hooks it needs, then feed it updates via
//! [`session::Session::handle_non_keepalive`]. Deserializing the wire
//! format, driving the actual long-poll transport, and the cryptographic
//! and DNS/filter/TKA subsystems are all external collaborators (§1, §6)
//! this crate does not implement.

pub mod address_filter;
pub mod alive;
pub mod blobs;
pub mod clock;
pub mod constants;
pub mod derp;
pub mod devknobs;
pub mod error;
pub mod ids;
pub mod keys;
pub mod netmap;
pub mod node;
pub mod observers;
pub mod peer_merge;
pub mod session;
pub mod sticky;
pub mod update;
pub mod user;
pub mod watchdog;

pub use error::SessionError;
pub use netmap::NetworkMap;
pub use node::{MachineStatus, Node, NodePatch, SelfNode};
pub use observers::{Observers, RequestContext};
pub use session::{Session, SnapshotConsumer};
pub use update::{DebugMessage, Update};
pub use watchdog::ResetSink;
