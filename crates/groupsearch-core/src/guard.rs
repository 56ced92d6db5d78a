//! Request guard: cancellation and deadline for a grouping request.
//!
//! The scheduler checks the guard before every fetch. A tripped guard never
//! interrupts a fetch in flight; the batch it returns is still evaluated and
//! the partial groups are returned.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a guard stopped a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTrip {
    /// [`CancelHandle::cancel`] was called.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
        /// Elapsed time in milliseconds.
        elapsed_ms: u64,
    },
}

impl fmt::Display for GuardTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "request cancelled"),
            Self::DeadlineExceeded {
                timeout_ms,
                elapsed_ms,
            } => write!(
                f,
                "request timed out: max={timeout_ms}ms, elapsed={elapsed_ms}ms"
            ),
        }
    }
}

/// Cancels the request owning the guard it was taken from.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-request cancellation flag plus optional deadline.
#[derive(Debug)]
pub struct RequestGuard {
    start: Instant,
    timeout: Option<Duration>,
    cancelled: Arc<AtomicBool>,
}

impl Default for RequestGuard {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RequestGuard {
    /// Creates a guard; the deadline clock starts now.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            timeout,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle that can cancel this request from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Elapsed time since the guard was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Checks cancellation first, then the deadline.
    ///
    /// # Errors
    ///
    /// Returns the reason the request must stop.
    pub fn check(&self) -> Result<(), GuardTrip> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(GuardTrip::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            let elapsed = self.start.elapsed();
            if elapsed > timeout {
                return Err(GuardTrip::DeadlineExceeded {
                    timeout_ms: timeout.as_millis() as u64,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}
