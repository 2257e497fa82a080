//! Request-scoped deadline propagation.
//!
//! # Responsibilities
//! - Carry one absolute expiry through the whole call tree
//! - Expose a cancellation signal that fires on expiry or explicit cancel
//! - Release the signal when the boundary returns
//!
//! # Design Decisions
//! - A derived context never outlives its parent: expiry is the minimum
//! - Cancellation chains through ancestors; cancelling a child never
//!   cancels its parent
//! - Teardown is tied to [`DeadlineGuard`] being dropped

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_all;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a context stopped accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DoneReason {
    /// The absolute expiry has passed.
    #[error("deadline exceeded")]
    Expired,
    /// The context or one of its ancestors was cancelled explicitly.
    #[error("context cancelled")]
    Cancelled,
}

/// One link of the cancellation chain.
#[derive(Debug)]
struct CancelSignal {
    tx: watch::Sender<bool>,
    parent: Option<Arc<CancelSignal>>,
}

impl CancelSignal {
    fn new(parent: Option<Arc<CancelSignal>>) -> Arc<Self> {
        let (tx, _) = watch::channel(false);
        Arc::new(Self { tx, parent })
    }

    fn is_cancelled(&self) -> bool {
        *self.tx.borrow() || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Receivers for this link and every ancestor, nearest first.
    fn receivers(&self) -> Vec<watch::Receiver<bool>> {
        let mut receivers = vec![self.tx.subscribe()];
        let mut next = self.parent.as_deref();
        while let Some(signal) = next {
            receivers.push(signal.tx.subscribe());
            next = signal.parent.as_deref();
        }
        receivers
    }
}

/// Deadline and cancellation signal shared by one call tree.
///
/// Cloning is cheap and yields a handle to the *same* context; use
/// [`derive`](Self::derive) to create a child.
#[derive(Debug, Clone)]
pub struct DeadlineContext {
    expires_at: Instant,
    signal: Arc<CancelSignal>,
}

impl DeadlineContext {
    /// Establish a root context expiring `budget` from now.
    ///
    /// The returned guard cancels the context when dropped, so every exit
    /// path of the boundary releases it.
    pub fn with_budget(budget: Duration) -> (Self, DeadlineGuard) {
        let ctx = Self {
            expires_at: Instant::now() + budget,
            signal: CancelSignal::new(None),
        };
        let guard = DeadlineGuard { ctx: ctx.clone() };
        (ctx, guard)
    }

    /// Child context with the parent's expiry, verbatim.
    pub fn derive(&self) -> Self {
        Self {
            expires_at: self.expires_at,
            signal: CancelSignal::new(Some(self.signal.clone())),
        }
    }

    /// Child context that may shorten, but never extend, the parent's budget.
    pub fn derive_with_budget(&self, budget: Duration) -> Self {
        let requested = Instant::now() + budget;
        Self {
            expires_at: requested.min(self.expires_at),
            signal: CancelSignal::new(Some(self.signal.clone())),
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.signal.tx.send_replace(true);
    }

    /// Non-blocking check of the signal. Cancellation wins over expiry.
    pub fn done_now(&self) -> Option<DoneReason> {
        if self.is_cancelled() {
            Some(DoneReason::Cancelled)
        } else if self.is_expired() {
            Some(DoneReason::Expired)
        } else {
            None
        }
    }

    /// Resolves once the context expires or is cancelled.
    pub async fn done(&self) -> DoneReason {
        if let Some(reason) = self.done_now() {
            return reason;
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => DoneReason::Cancelled,
            _ = tokio::time::sleep_until(self.expires_at) => DoneReason::Expired,
        }
    }

    async fn cancelled(&self) {
        let mut receivers = self.signal.receivers();
        let waits = receivers.iter_mut().map(|rx| {
            Box::pin(async move {
                let outcome = rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
                if outcome.is_err() {
                    // Sender gone: this link can no longer fire.
                    std::future::pending::<()>().await;
                }
            })
        });
        select_all(waits).await;
    }
}

/// Releases a root [`DeadlineContext`] when the boundary returns.
#[derive(Debug)]
pub struct DeadlineGuard {
    ctx: DeadlineContext,
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.ctx.cancel();
    }
}
