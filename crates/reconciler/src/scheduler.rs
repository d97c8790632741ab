//! One-shot, cancellable deletion timer.
//!
//! The scheduler only owns the timer; whoever fires it must confirm the
//! deletion is still wanted via [`DeletionScheduler::take_if_current`]
//! while holding the same lock that [`DeletionScheduler::cancel`] is called
//! under. That makes cancel-vs-fire race free: after `cancel` returns, no
//! earlier timer can act, and a timer that already won the lock finishes
//! before `cancel` can run.

use std::{future::Future, time::Duration};

use {
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::debug,
};

struct ScheduledDeletion {
    generation: u64,
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

pub struct DeletionScheduler {
    pending: Option<ScheduledDeletion>,
    generation: u64,
    shutdown: CancellationToken,
}

impl DeletionScheduler {
    /// Timers are children of `shutdown` and die with it.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            pending: None,
            generation: 0,
            shutdown,
        }
    }

    /// Start a timer that calls `fire(generation)` after `delay`.
    ///
    /// Any outstanding timer is cancelled first.
    pub fn schedule<F, Fut>(&mut self, delay: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => fire(generation).await,
                () = token.cancelled() => {
                    debug!(generation, "deferred deletion cancelled before firing");
                },
            }
        });

        self.pending = Some(ScheduledDeletion {
            generation,
            cancel,
            _handle: handle,
        });
        generation
    }

    /// Cancel the outstanding timer. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancel.cancel();
                true
            },
            None => false,
        }
    }

    /// Claim the timer identified by `generation` for firing.
    ///
    /// Returns `false` if it was cancelled or superseded in the meantime.
    pub fn take_if_current(&mut self, generation: u64) -> bool {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == generation)
        {
            self.pending = None;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for DeletionScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Arc,
            atomic::{AtomicU64, AtomicUsize, Ordering},
        },
    };

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicU64>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicU64::new(0)))
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let mut scheduler = DeletionScheduler::new(CancellationToken::new());
        let (fired, last) = counter();
        let (f, l) = (Arc::clone(&fired), Arc::clone(&last));
        let generation = scheduler.schedule(Duration::from_secs(30), move |g| async move {
            f.fetch_add(1, Ordering::SeqCst);
            l.store(g, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), generation);
        assert!(scheduler.take_if_current(generation));
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let mut scheduler = DeletionScheduler::new(CancellationToken::new());
        let (fired, _) = counter();
        let f = Arc::clone(&fired);
        scheduler.schedule(Duration::from_secs(30), move |_| async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_supersedes_previous_timer() {
        let mut scheduler = DeletionScheduler::new(CancellationToken::new());
        let (fired, last) = counter();

        let (f, l) = (Arc::clone(&fired), Arc::clone(&last));
        let first = scheduler.schedule(Duration::from_secs(10), move |g| async move {
            f.fetch_add(1, Ordering::SeqCst);
            l.store(g, Ordering::SeqCst);
        });
        let (f, l) = (Arc::clone(&fired), Arc::clone(&last));
        let second = scheduler.schedule(Duration::from_secs(20), move |g| async move {
            f.fetch_add(1, Ordering::SeqCst);
            l.store(g, Ordering::SeqCst);
        });
        assert_ne!(first, second);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), second);
        assert!(!scheduler.take_if_current(first));
        assert!(scheduler.take_if_current(second));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_cancels_timer() {
        let shutdown = CancellationToken::new();
        let mut scheduler = DeletionScheduler::new(shutdown.clone());
        let (fired, _) = counter();
        let f = Arc::clone(&fired);
        scheduler.schedule(Duration::from_secs(5), move |_| async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        shutdown.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
