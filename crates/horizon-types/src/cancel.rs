//! Cooperative cancellation token

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative cancellation token.
///
/// Held by the caller and observed by long-running pipeline stages:
/// synchronously via [`CancelToken::is_cancelled`] before starting new work,
/// and asynchronously via [`CancelToken::cancelled`] to interrupt in-flight
/// calls. Cancellation abandons outstanding work; it is distinct from a
/// deadline, which surfaces the partial result collected so far.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// Create a new token (not cancelled)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Check whether cancellation has been requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation
    ///
    /// All clones of this token observe the request, and every pending
    /// [`CancelToken::cancelled`] future resolves.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Relaxed);
        self.inner.notify.notify_waiters();
    }

    /// Resolve once cancellation is requested
    ///
    /// Completes immediately when the token is already cancelled. Intended
    /// for `select!` arms racing against in-flight work.
    pub async fn cancelled(&self) {
        // Register before the flag check so a cancel() landing between the
        // check and the await still wakes us.
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
