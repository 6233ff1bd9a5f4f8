//! Cancellation and deadlines
//!
//! Every operation takes a [`Context`] and hands it to the SQL collaborator.
//! The write path itself never polls it; collaborators call
//! [`Context::check`] before touching the database.

use crate::config::StoreConfig;
use crate::error::{KvError, KvResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cancellation flag plus an optional deadline.
///
/// Clones and children share the cancellation flag, so cancelling any of
/// them cancels all.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context with `deadline`, or the parent's if that one is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// Child context expiring `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Context carrying the configured statement timeout, if any.
    pub fn from_config(config: &StoreConfig) -> Self {
        match config.statement_timeout() {
            Some(timeout) => Self::background().with_timeout(timeout),
            None => Self::background(),
        }
    }

    /// Cancels this context and every context sharing its flag.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Err` once cancelled or past the deadline.
    pub fn check(&self) -> KvResult<()> {
        if self.is_cancelled() {
            return Err(KvError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(KvError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
