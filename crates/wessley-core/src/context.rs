use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::error::{Error, Result};

/// Cooperative-cancellation context carried through every Stage invocation.
///
/// Mirrors the spec's `(Context, In) -> Result[Out]` shape: a `Context`
/// carries an optional deadline and a cancellation signal that any
/// suspension point (HTTP call, rate-limit wait, retry backoff, bus RPC)
/// must honour.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline, not yet cancelled.
    pub fn background() -> Self {
        Context {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                deadline: None,
            }),
        }
    }

    /// A child context that additionally cancels itself after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Some(Instant::now() + timeout);
        let child = Context {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                deadline,
            }),
        };
        // Propagate cancellation of the parent into the child.
        let parent = self.clone();
        let child_clone = child.clone();
        tokio::spawn(async move {
            parent.cancelled().await;
            child_clone.cancel();
        });
        child
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Non-blocking check: has this context been cancelled or has its
    /// deadline passed?
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        false
    }

    /// Signal cancellation to this context and anything waiting on it.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Resolves once the context is cancelled (or immediately if it already
    /// is). Used by suspension points that need to race cancellation
    /// against useful work.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        if let Some(deadline) = self.inner.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::select! {
                _ = self.inner.notify.notified() => {}
                _ = tokio::time::sleep(remaining) => {}
            }
        } else {
            self.inner.notify.notified().await;
        }
    }

    /// Sleep for `duration`, returning early with [`Error::Cancelled`] if the
    /// context is cancelled (or its deadline passes) first.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => Ok(()),
            () = self.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Returns `Err(Error::Cancelled)` if the context has already been
    /// cancelled or its deadline has passed; otherwise `Ok(())`.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_context_is_not_cancelled() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.check().is_ok());
    }

    #[tokio::test]
    async fn cancel_is_observed() {
        let ctx = Context::background();
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn timeout_context_expires() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert!(!ctx.is_cancelled());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn sleep_returns_cancelled_on_cancel() {
        let ctx = Context::background();
        let ctx2 = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            ctx2.cancel();
        });
        let result = ctx.sleep(Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn child_cancels_with_parent() {
        let parent = Context::background();
        let child = parent.with_timeout(Duration::from_secs(30));
        parent.cancel();
        // give the propagation task a tick to run
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(child.is_cancelled());
    }
}
