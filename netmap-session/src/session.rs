//! §4.4 `Session`: the coordinator that owns all session-scoped state and
//! drives one update at a time through `PeerMerge`, `StickyState` and
//! `SnapshotBuilder`, dispatching observer hooks in the order §5 specifies.
//!
//! Grounded on `zebra_network::PeerSet`'s role as the single owner of
//! mutable connection state behind an otherwise stateless request/response
//! API: callers hand it requests (here, updates), it owns everything else.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::alive::{SessionAlive, SessionAliveHandle};
use crate::clock::{Clock, RealClock};
use crate::devknobs::DevKnobs;
use crate::error::SessionError;
use crate::keys::{MachinePublicKey, PrivateNodeKey};
use crate::netmap::{NetworkMap, SnapshotBuilder};
use crate::node::{Node, SelfNode};
use crate::observers::{BoxFuture, Observers, RequestContext};
use crate::sticky::StickyState;
use crate::update::Update;
use crate::watchdog::{ResetSink, Watchdog};

/// Hook used by the "control-knobs setter" collaborator (§6): given the
/// current self-node, returns the control-knob payload to apply before the
/// snapshot is built. Defaults to a no-op, since this crate's `Node` shape
/// carries no control-knobs field of its own — an embedder with such a
/// field supplies a setter that reads it.
pub type ControlKnobsSetter = Arc<dyn Fn(&SelfNode) + Send + Sync>;

/// Hook used by the "display-name initializer" collaborator (§6): given
/// whichever self-node view is valid for this update (the new one if
/// present, else the last-observed one) and the update itself, mutates
/// node objects inside the update in place (§4.4.1 step 4 — unconditional,
/// unlike step 3). Defaults to a no-op for the same reason as
/// [`ControlKnobsSetter`].
pub type DisplayNameInitializer = Arc<dyn Fn(Option<&SelfNode>, &mut Update) + Send + Sync>;

/// §6 "the primary output": delivers a fully materialized snapshot to the
/// rest of the node's runtime. Async because delivery is the one
/// caller-visible suspension point besides `on_debug` (§5 "Suspension
/// points").
pub type SnapshotConsumer = Arc<dyn Fn(Arc<NetworkMap>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Owns all per-session state: the previous peer list, sticky fields, the
/// self-node, and the watchdog (§4.4, §5). One `Session` corresponds to one
/// long-poll session with the control plane.
pub struct Session {
    private_node_key: PrivateNodeKey,
    machine_public_key: MachinePublicKey,

    prev_peers: Vec<Node>,
    sticky: StickyState,
    self_node: Option<SelfNode>,
    knobs: DevKnobs,

    clock: Arc<dyn Clock>,
    observers: Observers,
    control_knobs_setter: ControlKnobsSetter,
    display_name_initializer: DisplayNameInitializer,

    reset_sink: ResetSink,
    watchdog: Option<Watchdog>,
    alive: SessionAlive,
    alive_handle: SessionAliveHandle,
    closed: AtomicBool,

    snapshot_consumer: SnapshotConsumer,
}

impl Session {
    /// Builds a new session (§4.4 `new`). `private_node_key` is fixed for
    /// the session's lifetime; `snapshot_consumer` is §6's "the primary
    /// output" — it receives every snapshot produced by
    /// `handle_non_keepalive`, after the other observer hooks have run (§5
    /// ordering), and may suspend (§5 "Suspension points"). All other
    /// collaborators start out as discard-loggers or no-op observers,
    /// configurable via the setters below.
    pub fn new(private_node_key: PrivateNodeKey, snapshot_consumer: SnapshotConsumer) -> Self {
        let (alive, alive_handle) = SessionAlive::new();
        Session {
            private_node_key,
            machine_public_key: MachinePublicKey::default(),
            prev_peers: Vec::new(),
            sticky: StickyState::new(),
            self_node: None,
            knobs: DevKnobs::from_env(),
            clock: Arc::new(RealClock),
            observers: Observers::default(),
            control_knobs_setter: Arc::new(|_self_node: &SelfNode| {}),
            display_name_initializer: Arc::new(|_self_node: Option<&SelfNode>, _update: &mut Update| {}),
            reset_sink: ResetSink::new(),
            watchdog: None,
            alive,
            alive_handle,
            closed: AtomicBool::new(false),
            snapshot_consumer,
        }
    }

    pub fn verbose_logger(&mut self, f: Arc<dyn Fn(&str) + Send + Sync>) -> &mut Self {
        self.observers.verbose_logger = f;
        self
    }

    pub fn logger(&mut self, f: Arc<dyn Fn(&str) + Send + Sync>) -> &mut Self {
        self.observers.logger = f;
        self
    }

    /// Overrides the clock (§6 "Input: Clock"), normally only used in
    /// tests.
    pub fn alt_clock(&mut self, clock: Arc<dyn Clock>) -> &mut Self {
        self.clock = clock;
        self
    }

    pub fn machine_public_key(&mut self, key: MachinePublicKey) -> &mut Self {
        self.machine_public_key = key;
        self
    }

    pub fn cancel_hook(&mut self, f: Arc<dyn Fn() + Send + Sync>) -> &mut Self {
        self.observers.cancel_hook = f;
        self
    }

    pub fn on_debug(
        &mut self,
        f: Arc<
            dyn Fn(
                    RequestContext,
                    crate::update::DebugMessage,
                    ResetSink,
                ) -> crate::observers::BoxFuture<
                    'static,
                    Result<(), crate::error::ObserverError>,
                > + Send
                + Sync,
        >,
    ) -> &mut Self {
        self.observers.on_debug = f;
        self
    }

    pub fn on_concise_summary(&mut self, f: Arc<dyn Fn(&str) + Send + Sync>) -> &mut Self {
        self.observers.on_concise_summary = f;
        self
    }

    pub fn on_self_node_changed(
        &mut self,
        f: Arc<dyn Fn(Arc<NetworkMap>) + Send + Sync>,
    ) -> &mut Self {
        self.observers.on_self_node_changed = f;
        self
    }

    /// §6 "control-knobs setter" collaborator.
    pub fn control_knobs_setter(&mut self, f: ControlKnobsSetter) -> &mut Self {
        self.control_knobs_setter = f;
        self
    }

    /// §6 "display-name initializer" collaborator.
    pub fn display_name_initializer(&mut self, f: DisplayNameInitializer) -> &mut Self {
        self.display_name_initializer = f;
        self
    }

    /// Starts the background watchdog (§4.3, §4.4 `start_watchdog`).
    /// Calling this more than once replaces the previous watchdog task;
    /// the crate does not guard against that since nothing in §4.4 forbids
    /// it.
    pub fn start_watchdog(&mut self) {
        let watchdog = Watchdog::spawn(
            self.clock.clone(),
            self.alive_handle.clone(),
            self.observers.cancel_hook.clone(),
            self.reset_sink.clone(),
        );
        self.watchdog = Some(watchdog);
    }

    /// §4.4.1: processes one non-keepalive update end to end, dispatching
    /// observer callbacks in the order §5 mandates: `on_debug`,
    /// `on_concise_summary`, `on_self_node_changed` (conditionally), then
    /// the snapshot consumer.
    pub async fn handle_non_keepalive(
        &mut self,
        ctx: RequestContext,
        mut update: Update,
    ) -> Result<(), SessionError> {
        // Step 1: dispatch the debug sub-message first, regardless of
        // whether the session's watchdog has been started yet — the reset
        // sink handed here is always valid (§6).
        if let Some(debug) = update.debug.take() {
            (self.observers.on_debug)(ctx.clone(), debug, self.reset_sink.clone())
                .await
                .map_err(SessionError::DebugHookFailure)?;
        }

        // Step 2: apply env-driven dev knobs to the incoming update before
        // it touches the peer list (§4.6).
        self.knobs.apply_to_update(&mut update);

        // Step 3: strip self-node capabilities per the strip-capabilities
        // knob, and run the control-knobs setter collaborator, before the
        // self-node is folded into sticky state. Conditional on the update
        // actually carrying a self-node.
        let had_self_node_update = update.self_node.is_some();
        if let Some(self_node) = update.self_node.as_mut() {
            self.knobs.apply_to_self_node(&mut self_node.node);
            (self.control_knobs_setter)(self_node);
        }

        // Step 4: unlike step 3, this runs on every update — against
        // whichever self-node view is valid (the new one if present, else
        // the last-observed one) — and mutates nodes inside the update in
        // place (§6). The view is cloned so the initializer can receive a
        // `&SelfNode` without holding a borrow of `update` across the
        // `&mut update` it also needs.
        let self_view = update.self_node.clone().or_else(|| self.self_node.clone());
        (self.display_name_initializer)(self_view.as_ref(), &mut update);

        let prev_peers = std::mem::take(&mut self.prev_peers);
        let (snapshot, merged_peers) = SnapshotBuilder::build(
            prev_peers,
            &mut update,
            self.clock.as_ref(),
            &mut self.sticky,
            &mut self.self_node,
            &self.knobs,
            &self.private_node_key,
            &self.machine_public_key,
        );
        self.prev_peers = merged_peers;

        let snapshot = Arc::new(snapshot);

        // Step 6: fire the concise-summary observer.
        (self.observers.on_concise_summary)(&snapshot.concise_summary());
        (self.observers.logger)(&snapshot.concise_summary());

        // Step 7 (conditional): only when this update actually carried a
        // self-node change.
        if had_self_node_update {
            (self.observers.on_self_node_changed)(snapshot.clone());
        }

        // Step 8: hand the snapshot to the caller-supplied consumer last,
        // after every other observer has seen it (§5 ordering). This is
        // §6's `update_full_netmap` — the primary output — and the one
        // suspension point besides `on_debug` (§5 "Suspension points").
        (self.snapshot_consumer)(snapshot.clone()).await;

        debug!(peers = self.prev_peers.len(), "processed update");
        Ok(())
    }

    /// Resets the watchdog timer (§4.3), equivalent to what `on_debug`
    /// receiving a `ResetSink` would do, exposed for callers that reset it
    /// for reasons other than a debug sub-message.
    pub fn reset_watchdog(&self) {
        self.reset_sink.reset();
    }

    /// Tears the session down (§4.4 `close`): cancels the alive signal
    /// exactly once (idempotent — §8 P8), which in turn stops the
    /// watchdog loop without invoking its cancel hook.
    pub fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.alive.cancel();
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.alive.is_cancelled()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            warn!("Session dropped without close(); cancelling alive signal");
            self.alive.cancel();
        }
    }
}
