//! Stage Context
//!
//! Cancellation and deadline signalling passed through to every stage.
//! The orchestrator never polls it; stages decide where to observe it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ContextError;

/// Per-call context handed to [`Stage::run`](super::Stage::run).
///
/// Clones share the same cancellation flag, so a clone kept by the caller
/// (or another thread) can cancel a running stage.
#[derive(Debug, Clone, Default)]
pub struct StageContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl StageContext {
    /// Creates a context with no deadline that is never cancelled unless asked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Signals cancellation to every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns an error if the call was cancelled or has run past its deadline.
    ///
    /// Stages that do blocking work call this between units of work and
    /// propagate the error with `?`.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        if self.is_expired() {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_default_context_is_live() {
        let ctx = StageContext::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert_eq!(ctx.check(), Ok(()));
    }

    #[test]
    fn test_cancel_is_shared_across_clones() {
        let ctx = StageContext::new();
        let handle = ctx.clone();

        thread::spawn(move || handle.cancel()).join().unwrap();

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = StageContext::new().deadline_at(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn test_future_deadline() {
        let ctx = StageContext::with_timeout(Duration::from_secs(60));
        assert!(!ctx.is_expired());
        assert!(ctx.remaining().unwrap() > Duration::from_secs(30));
        assert!(ctx.check().is_ok());
    }
}
