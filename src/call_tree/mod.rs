//! Call tree subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrival
//!     → orchestrator.rs (deadline + root span)
//!     → stages in sequence (auth → query), first failure skips the rest
//!     → root span closed, failure recorded on it
//!     → acknowledgement emitted (state.rs tracks each step)
//! ```

pub mod orchestrator;
pub mod state;

pub use orchestrator::{CallTree, CallTreeReport, StageOutcome, ACKNOWLEDGEMENT, ROOT_SPAN};
pub use state::{CallTreeState, StateTrail};
