//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrival:
//!     → deadline.rs (establish one absolute expiry for the call tree)
//!     → derive() per nested operation (expiry inherited, never extended)
//!     → timeouts.rs (race each unit of work against the deadline)
//!     → DeadlineGuard dropped at the boundary (signal released)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every unit of work races the deadline
//! - Cancellation is cooperative: the waiter stops waiting, work is dropped
//! - No retries: a unit of work gets exactly one attempt

pub mod deadline;
pub mod timeouts;

pub use deadline::{DeadlineContext, DeadlineGuard, DoneReason};
pub use timeouts::await_either;
