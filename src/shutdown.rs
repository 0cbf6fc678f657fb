//! Cooperative shutdown signal.
//!
//! SIGINT and the interactive quit key both funnel into one signal
//! observed by the scheduler (stop issuing rounds) and by the
//! interactive renderer (stop its refresh loop).

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Notify;
use tracing::info;

/// Process-wide cancellation signal.
///
/// Requesting shutdown is sticky: once requested it stays requested,
/// and all current and future waiters are released.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    /// Returns true if shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Relaxed)
    }

    /// Request shutdown and wake all waiters.
    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        loop {
            if self.is_requested() {
                return;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Spawn a task that requests shutdown on SIGINT (Ctrl-C).
    pub fn listen_for_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                signal.request();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn request_releases_waiters() {
        let signal = ShutdownSignal::default();
        assert!(!signal.is_requested());

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.request();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be released")
            .expect("waiter task should not panic");
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_already_requested() {
        let signal = ShutdownSignal::default();
        signal.request();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("wait should not block");
    }
}
