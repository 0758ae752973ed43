use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative cancellation token shared between an orchestrator run and the
/// adapter calls it fans out. Cloning is cheap; cancelling through any clone
/// is visible to all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token has been cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register with the notify wait list before re-checking the
            // flag. notify_waiters() stores no permit, so a cancel landing
            // before registration would otherwise be lost and the waiter
            // would park forever.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.inner.notify.notified());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_after_cancel() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_racing_a_fresh_waiter_is_never_lost() {
        // The waiter may be cancelled before its future is first polled;
        // it must still resolve. Iterate to give the race a chance to bite.
        for _ in 0..100 {
            let token = CancelToken::new();
            let waiter = token.clone();
            let handle = tokio::spawn(async move { waiter.cancelled().await });
            token.cancel();
            timeout(Duration::from_secs(1), handle)
                .await
                .expect("waiter should observe the cancel")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_pending_without_cancel() {
        let token = CancelToken::new();
        assert!(timeout(Duration::from_millis(10), token.cancelled())
            .await
            .is_err());
    }
}
