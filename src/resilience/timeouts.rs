//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race a unit of work against the call tree's deadline
//! - Stop waiting cleanly when the deadline wins
//!
//! # Design Decisions
//! - Uses `tokio::select!`; the losing branch is dropped, not interrupted
//! - Work is never started against a context that is already done
//! - Timeout errors are distinct from other errors ([`DoneReason`])

use std::future::Future;

use crate::resilience::deadline::{DeadlineContext, DoneReason};

/// Race `work` against `ctx`, returning whichever resolves first.
pub async fn await_either<F, T>(ctx: &DeadlineContext, work: F) -> Result<T, DoneReason>
where
    F: Future<Output = T>,
{
    if let Some(reason) = ctx.done_now() {
        return Err(reason);
    }

    tokio::select! {
        output = work => Ok(output),
        reason = ctx.done() => Err(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_work_wins_before_deadline() {
        let (ctx, _guard) = DeadlineContext::with_budget(Duration::from_secs(1));
        let result = await_either(&ctx, async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            42
        })
        .await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_over_slow_work() {
        let (ctx, _guard) = DeadlineContext::with_budget(Duration::from_millis(50));
        let start = tokio::time::Instant::now();
        let result = await_either(&ctx, tokio::time::sleep(Duration::from_millis(500))).await;

        assert_eq!(result, Err(DoneReason::Expired));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_context_skips_work() {
        let (ctx, _guard) = DeadlineContext::with_budget(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(5)).await;

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let result = await_either(&ctx, async move {
            flag.store(true, Ordering::SeqCst);
        })
        .await;

        assert_eq!(result, Err(DoneReason::Expired));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let (ctx, _guard) = DeadlineContext::with_budget(Duration::from_secs(10));
        let child = ctx.derive();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = await_either(&child, tokio::time::sleep(Duration::from_secs(5))).await;
        assert_eq!(result, Err(DoneReason::Cancelled));
    }
}
