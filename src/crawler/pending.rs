//! Pending-work counter gating crawl termination
//!
//! The crawler accepts work faster than it completes it, and completed
//! work can create more work. The counter is incremented when a URL is
//! accepted and decremented once its resource has been handed downstream,
//! so reaching zero means no more work can ever appear.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counts targets accepted but not yet emitted as resources.
#[derive(Debug, Default)]
pub struct Pending {
    count: AtomicUsize,
    drained: Notify,
}

impl Pending {
    /// Records `n` new units of work. Callers must add before handing the
    /// work to a channel, never after, so the counter cannot transiently
    /// read zero while work is still upstream.
    pub fn add(&self, n: usize) {
        if n > 0 {
            self.count.fetch_add(n, Ordering::SeqCst);
        }
    }

    /// Records completion of one unit of work.
    pub fn done(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Current number of outstanding units.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until the counter reaches zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a final `done` landing
            // between the check and the await cannot be missed.
            notified.as_mut().enable();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_immediately_at_zero() {
        let pending = Pending::default();
        pending.wait().await;
    }

    #[tokio::test]
    async fn test_wait_blocks_until_drained() {
        let pending = Arc::new(Pending::default());
        pending.add(2);

        let waiter = {
            let pending = Arc::clone(&pending);
            tokio::spawn(async move { pending.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        pending.done();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        pending.done();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait should complete once drained")
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_zero_is_noop() {
        let pending = Pending::default();
        pending.add(0);
        assert_eq!(pending.count(), 0);
        pending.wait().await;
    }

    #[tokio::test]
    async fn test_count_tracks_batches() {
        let pending = Pending::default();
        pending.add(3);
        assert_eq!(pending.count(), 3);
        pending.done();
        assert_eq!(pending.count(), 2);
    }
}
