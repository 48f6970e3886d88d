//! Timer-based debouncing.
//!
//! [`Debouncer`] coalesces bursts of events: every [`Debouncer::schedule`]
//! call replaces the previously scheduled task, and a task only starts once
//! its delay has elapsed without a newer schedule. Once a task has started it
//! runs to completion on its own; only tasks still waiting out their delay
//! can be cancelled.
//!
//! Must be used from within a tokio runtime.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period for search input.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(500);

/// Runs at most one pending task after a quiet period.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DELAY)
    }
}

impl Debouncer {
    /// Create a debouncer whose [`trigger`](Self::trigger) waits `delay`.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `task` to start after `after`, cancelling any task still
    /// waiting for its turn.
    pub fn schedule<F, Fut>(&self, after: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let timer = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Detach so a later cancel can't abort a task that already began
            tokio::spawn(task());
        });

        if let Some(previous) = self.pending().replace(timer) {
            previous.abort();
        }
    }

    /// Schedule `task` after the configured delay.
    pub fn trigger<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule(self.delay, task);
    }

    /// Cancel the pending task, if it hasn't started yet.
    ///
    /// Returns `true` if a waiting task was cancelled.
    pub fn cancel_pending(&self) -> bool {
        match self.pending().take() {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a task is still waiting out its delay.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    // The guarded handle is always left consistent, so a poisoned lock is
    // still safe to use.
    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_runs_after_delay() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::unbounded_channel();

        debouncer.trigger(move || async move {
            tx.send("fired").unwrap();
        });
        assert!(debouncer.has_pending());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.recv().await, Some("fired"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_last() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::unbounded_channel();

        for text in ["l", "la", "lap", "lapt", "laptop"] {
            let tx = tx.clone();
            debouncer.trigger(move || async move {
                tx.send(text).unwrap();
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        drop(tx);

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(rx.recv().await, Some("laptop"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        debouncer.trigger(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(debouncer.cancel_pending());
        assert!(!debouncer.has_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!debouncer.cancel_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_task_is_not_cancelled() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        debouncer.trigger(move || async move {
            started_tx.send(()).unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            done_tx.send(()).unwrap();
        });

        started_rx.recv().await.unwrap();
        debouncer.cancel_pending();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(done_rx.recv().await, Some(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poisoned_lock_still_coalesces() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(100)));
        let holder = Arc::clone(&debouncer);
        let _ = std::thread::spawn(move || {
            let _pending = holder.pending.lock().unwrap();
            panic!("panicked while holding the lock");
        })
        .join();
        assert!(debouncer.pending.is_poisoned());

        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&runs);
            debouncer.trigger(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(debouncer.has_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        debouncer.trigger(|| async {});
        assert!(debouncer.cancel_pending());
    }
}
