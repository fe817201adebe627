//! §4.3 Watchdog: the background timer that cancels the session if no
//! activity arrives within `WATCHDOG_TIMEOUT`.
//!
//! Grounded on `CandidateSet::next`'s timer-swap-and-await pattern
//! (`candidate_set.rs`, which uses `tokio::time::{sleep_until, Sleep}` and
//! `mem::swap` to replace a live timer without losing track of the old
//! one), generalized here into a `select!`-driven reset/cancel loop. Using
//! `tokio::select!` to race the timer against the reset and alive signals
//! gets the "drain must itself be cancellable" requirement (§9 "Watchdog
//! race") for free: whichever branch resolves first wins, and the other
//! futures — including a timer that already fired — are simply dropped.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::alive::SessionAliveHandle;
use crate::clock::Clock;
use crate::constants::WATCHDOG_TIMEOUT;

/// Sent into from `on_debug` (or anywhere else) to defer the watchdog by a
/// fresh `WATCHDOG_TIMEOUT`. Cloneable, non-blocking: a reset sent while
/// nothing is listening is not lost (the next `notified().await` observes
/// it), but redundant resets do not queue up (§5 "level-triggered").
#[derive(Clone)]
pub struct ResetSink(Arc<Notify>);

impl ResetSink {
    /// Builds a sink with no watchdog listening yet. `Session` creates one
    /// of these at construction time, before `start_watchdog` is ever
    /// called, so `on_debug` always has a sink to send on (§6).
    pub fn new() -> Self {
        ResetSink(Arc::new(Notify::new()))
    }

    pub fn reset(&self) {
        self.0.notify_one();
    }
}

impl Default for ResetSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the spawned watchdog task. Dropping this handle does not stop the
/// task — only the session-alive signal or a timeout does (§5
/// "Cancellation"); `Watchdog` just remembers how to reach it.
pub struct Watchdog {
    reset_sink: ResetSink,
    task: JoinHandle<()>,
}

impl Watchdog {
    /// Starts the watchdog (§4.4 `start_watchdog`). `cancel_hook` is
    /// invoked exactly once, on timeout (§7, §8 P8). `reset_sink` is
    /// shared with the `Session` that spawns this watchdog so resets sent
    /// before (or after) the watchdog's lifetime are harmless no-ops
    /// rather than needing a separate plumbing step.
    pub fn spawn(
        clock: Arc<dyn Clock>,
        alive: SessionAliveHandle,
        cancel_hook: Arc<dyn Fn() + Send + Sync>,
        reset_sink: ResetSink,
    ) -> Self {
        let notify = reset_sink.0.clone();
        let task = tokio::spawn(Self::run(clock, alive, notify, cancel_hook));
        Watchdog { reset_sink, task }
    }

    pub fn reset_sink(&self) -> ResetSink {
        self.reset_sink.clone()
    }

    /// Aborts the background task directly, for use by `close()` alongside
    /// cancelling the alive signal (belt and suspenders: the alive signal
    /// is what the spec models, the abort just reclaims the task promptly).
    pub fn abort(&self) {
        self.task.abort();
    }

    async fn run(
        clock: Arc<dyn Clock>,
        mut alive: SessionAliveHandle,
        notify: Arc<Notify>,
        cancel_hook: Arc<dyn Fn() + Send + Sync>,
    ) {
        let mut timer = clock.new_timer(WATCHDOG_TIMEOUT);
        loop {
            tokio::select! {
                _ = timer.wait() => {
                    warn!("map response long-poll timed out");
                    cancel_hook();
                    return;
                }
                _ = notify.notified() => {
                    timer.stop();
                    timer.reset(WATCHDOG_TIMEOUT);
                }
                _ = alive.cancelled() => {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alive::SessionAlive;
    use crate::clock::test_support::VirtualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn fires_cancel_hook_exactly_once_on_timeout() {
        let clock: Arc<dyn Clock> = Arc::new(VirtualClock::default());
        let (alive, handle) = SessionAlive::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        let watchdog = Watchdog::spawn(
            clock,
            handle,
            Arc::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
            ResetSink::new(),
        );

        tokio::time::advance(WATCHDOG_TIMEOUT + Duration::from_millis(1)).await;
        // Let the spawned task observe the elapsed timer.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(1)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        alive.cancel(); // P8: closing afterwards must not fire again.
        tokio::time::advance(WATCHDOG_TIMEOUT * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        let _ = watchdog; // keep alive for the duration of the test
    }

    #[tokio::test(start_paused = true)]
    async fn reset_prevents_timeout() {
        let clock: Arc<dyn Clock> = Arc::new(VirtualClock::default());
        let (alive, handle) = SessionAlive::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        let watchdog = Watchdog::spawn(
            clock,
            handle,
            Arc::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
            ResetSink::new(),
        );
        let reset_sink = watchdog.reset_sink();

        tokio::time::advance(WATCHDOG_TIMEOUT - Duration::from_millis(1)).await;
        reset_sink.reset();
        tokio::task::yield_now().await;
        tokio::time::advance(WATCHDOG_TIMEOUT - Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        alive.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn close_before_timeout_never_invokes_cancel_hook() {
        let clock: Arc<dyn Clock> = Arc::new(VirtualClock::default());
        let (alive, handle) = SessionAlive::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        let watchdog = Watchdog::spawn(
            clock,
            handle,
            Arc::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
            ResetSink::new(),
        );

        alive.cancel();
        tokio::task::yield_now().await;
        tokio::time::advance(WATCHDOG_TIMEOUT * 4).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        let _ = watchdog;
    }
}
