//! §7 Error handling design.
//!
//! Only one failure mode is ever surfaced from the public API; everything
//! else in §7 (`InternalOrderViolation`, `ParseFailure`, `UnknownIdPatch`)
//! is recovered locally and only observable via logs and the next
//! snapshot's contents (see `peer_merge`, `sticky`).

use std::error::Error as StdError;

/// Boxed, type-erased observer error, so this crate does not need to know
/// the concrete error type any particular `on_debug` implementation uses.
pub type ObserverError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The observer for a debug sub-message failed (§4.4.1 step 1). The
    /// caller is expected to tear down the session.
    #[error("on_debug hook failed: {0}")]
    DebugHookFailure(#[source] ObserverError),
}
