//! Operations subsystem.
//!
//! # Data Flow
//! ```text
//! CallContext { deadline, span } (context.rs)
//!     → Operation::execute (operation.rs)
//!         → child span opened under the caller's span
//!         → prerequisites executed in order (fail fast)
//!         → Workload raced against the deadline (workload.rs)
//!         → OperationError recorded on the span (error.rs)
//!     → span finished, result returned upward
//! ```
//!
//! # Design Decisions
//! - One uniform contract for every operation; composition via prerequisites
//! - Errors are recorded at every level they pass through
//! - The standard tree lives in catalog.rs, built from config

pub mod catalog;
pub mod context;
pub mod error;
pub mod operation;
pub mod workload;

pub use catalog::{standard_pipeline, StandardWorkloads, AUTH, AUTH_INNER, QUERY};
pub use context::CallContext;
pub use error::OperationError;
pub use operation::Operation;
pub use workload::{FixedDelay, Immediate, RandomDelay, Workload};
