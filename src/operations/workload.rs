//! Simulated units of work.
//!
//! Stand-ins for real authentication or query work: each one only waits.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use rand::Rng;

use crate::config::{WorkloadConfig, WorkloadKind};

/// A unit of work an operation races against its deadline.
///
/// The returned future must not borrow `self`; it may be dropped unfinished
/// when the deadline wins.
pub trait Workload: Send + Sync + fmt::Debug {
    fn perform(&self) -> BoxFuture<'static, ()>;
}

/// Sleeps for a uniformly random duration in `0..ceiling`.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    pub ceiling: Duration,
}

impl Workload for RandomDelay {
    fn perform(&self) -> BoxFuture<'static, ()> {
        let ceiling_ms = self.ceiling.as_millis() as u64;
        if ceiling_ms == 0 {
            return future::ready(()).boxed();
        }
        let delay = Duration::from_millis(rand::thread_rng().gen_range(0..ceiling_ms));
        tokio::time::sleep(delay).boxed()
    }
}

/// Sleeps for exactly `delay`.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Workload for FixedDelay {
    fn perform(&self) -> BoxFuture<'static, ()> {
        tokio::time::sleep(self.0).boxed()
    }
}

/// Completes on first poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Workload for Immediate {
    fn perform(&self) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}

/// Build the workload described by `config`.
pub fn from_config(config: &WorkloadConfig) -> Arc<dyn Workload> {
    match config.kind {
        WorkloadKind::Random => Arc::new(RandomDelay {
            ceiling: config.ceiling(),
        }),
        WorkloadKind::Fixed => Arc::new(FixedDelay(config.ceiling())),
        WorkloadKind::Immediate => Arc::new(Immediate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_random_delay_stays_below_ceiling() {
        let workload = RandomDelay {
            ceiling: Duration::from_millis(100),
        };
        for _ in 0..20 {
            let start = Instant::now();
            workload.perform().await;
            assert!(start.elapsed() < Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_waits_full_duration() {
        let start = Instant::now();
        FixedDelay(Duration::from_millis(250)).perform().await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_zero_ceiling_completes_immediately() {
        let workload = from_config(&WorkloadConfig::random(0));
        workload.perform().await;
    }
}
