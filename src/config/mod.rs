//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → deadline budget + workloads handed to the call tree
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, DeadlineConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig, TracerConfig,
    WorkloadConfig, WorkloadKind, WorkloadsConfig,
};
pub use validation::{validate_config, ValidationError};
