//! Request-scoped tracing harness library.
//!
//! Every inbound request becomes one call tree: a deadline is established at
//! the boundary, a root span is opened, and operations run beneath it, each
//! in its own child span and each racing the shared deadline.

// Core
pub mod call_tree;
pub mod operations;
pub mod resilience;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

// Boundary
pub mod http;

pub use call_tree::{CallTree, CallTreeReport};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Tracer;
