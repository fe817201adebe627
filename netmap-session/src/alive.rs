//! The session-alive signal (§5 "Shared resources"): a one-shot broadcast
//! that `close()` fires exactly once, and that the watchdog and any other
//! concurrent activity select on to know the session has ended.

use tokio::sync::watch;

#[derive(Debug)]
pub struct SessionAlive {
    tx: watch::Sender<bool>,
}

#[derive(Clone, Debug)]
pub struct SessionAliveHandle {
    rx: watch::Receiver<bool>,
}

impl SessionAlive {
    pub fn new() -> (Self, SessionAliveHandle) {
        let (tx, rx) = watch::channel(false);
        (SessionAlive { tx }, SessionAliveHandle { rx })
    }

    /// Cancels the session. Idempotent: a second call is a no-op.
    pub fn cancel(&self) {
        let _ = self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        });
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl SessionAliveHandle {
    /// Resolves once [`SessionAlive::cancel`] has been called.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|v| *v).await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_resolves_waiting_handle() {
        let (alive, mut handle) = SessionAlive::new();
        assert!(!handle.is_cancelled());
        alive.cancel();
        handle.cancelled().await;
        assert!(handle.is_cancelled());
    }

    #[test]
    fn double_cancel_is_idempotent() {
        let (alive, _handle) = SessionAlive::new();
        alive.cancel();
        alive.cancel();
        assert!(alive.is_cancelled());
    }
}
