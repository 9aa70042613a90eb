//! Per-call cancellation and deadline.
//!
//! A [`RerankContext`] is cheap to clone; clones share one cancellation
//! flag. Blocking code polls [`RerankContext::check`], async code can race
//! work against [`RerankContext::done`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Notify;

/// Why a context stopped admitting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Default)]
struct Cancellation {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation token with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct RerankContext {
    cancellation: Arc<Cancellation>,
    deadline: Option<Instant>,
}

impl RerankContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A deadline `timeout` from now. A timeout too large to represent as an
    /// `Instant` leaves the context without a deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancellation: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Derives a context sharing this one's cancellation, bounded by the
    /// earlier of the existing deadline and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, candidate) => existing.or(candidate),
        };
        Self {
            cancellation: Arc::clone(&self.cancellation),
            deadline,
        }
    }

    /// Requests cancellation; wakes every task waiting in [`Self::done`].
    pub fn cancel(&self) {
        // Release pairs with the Acquire load in is_cancelled
        self.cancellation.cancelled.store(true, Ordering::Release);
        self.cancellation.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.cancelled.load(Ordering::Acquire)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (`None` without a deadline).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails if the context was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            loop {
                let notified = self.cancellation.notify.notified();
                tokio::pin!(notified);
                // register before re-checking the flag so a concurrent cancel is not missed
                notified.as_mut().enable();
                if self.is_cancelled() {
                    return;
                }
                notified.await;
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = cancelled => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                        ContextError::DeadlineExceeded
                    }
                }
            }
            None => {
                cancelled.await;
                ContextError::Cancelled
            }
        }
    }
}
