//! Abstract time source for the watchdog and liveness stamps (§6 "Input:
//! Clock").
//!
//! Grounded on `CandidateSet`'s use of `tokio::time::{sleep, sleep_until,
//! Sleep}` and its `mem::swap`-based timer-replacement idiom in
//! `CandidateSet::next` (`candidate_set.rs`), generalized here into a small
//! capability trait so the watchdog can be driven by either real time or a
//! test double.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// A resettable, stoppable timer, as required by §4.3/§6.
pub trait Timer: Send {
    /// Stops the timer. Returns `true` if it was stopped before firing.
    fn stop(&mut self) -> bool;

    /// Rearms the timer for `duration` from now.
    fn reset(&mut self, duration: Duration);

    /// Waits for the timer to fire. Resolves immediately if it already
    /// fired and hasn't been reset since.
    fn wait<'a>(&'a mut self) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>>;
}

/// Capability record for time (§9 "Polymorphism"): the only two things the
/// rest of the crate needs are "what time is it" and "give me a timer".
pub trait Clock: Send + Sync {
    /// Wall-clock time, used to stamp `last_seen` (§4.1 step 3).
    fn now(&self) -> DateTime<Utc>;

    /// Creates a new timer that fires after `duration`.
    fn new_timer(&self, duration: Duration) -> Box<dyn Timer>;
}

/// The default clock: real wall-clock time via `chrono::Utc::now`, real
/// timers via `tokio::time::sleep`.
#[derive(Copy, Clone, Debug, Default)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn new_timer(&self, duration: Duration) -> Box<dyn Timer> {
        Box::new(TokioTimer {
            sleep: Box::pin(tokio::time::sleep(duration)),
        })
    }
}

struct TokioTimer {
    sleep: std::pin::Pin<Box<tokio::time::Sleep>>,
}

impl Timer for TokioTimer {
    fn stop(&mut self) -> bool {
        let deadline = self.sleep.deadline();
        let stopped_before_firing = Instant::now() < deadline;
        // Rearm far in the future; the watchdog drops this timer on stop
        // in practice, but leaving it live-but-distant keeps `Timer` safe
        // to call again.
        self.sleep
            .as_mut()
            .reset(Instant::now() + Duration::from_secs(365 * 24 * 3600));
        stopped_before_firing
    }

    fn reset(&mut self, duration: Duration) {
        self.sleep.as_mut().reset(Instant::now() + duration);
    }

    fn wait<'a>(&'a mut self) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { self.sleep.as_mut().await })
    }
}
