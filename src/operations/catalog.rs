//! The standard operations of one request.
//!
//! ```text
//! request
//!  ├── auth
//!  │    └── auth_inner   (prerequisite of auth)
//!  └── query             (skipped when auth fails)
//! ```

use std::sync::Arc;

use crate::config::WorkloadsConfig;
use crate::operations::operation::Operation;
use crate::operations::workload::{self, Workload};

pub const AUTH: &str = "auth";
pub const AUTH_INNER: &str = "auth_inner";
pub const QUERY: &str = "query";

/// Workloads of the three standard operations.
#[derive(Debug, Clone)]
pub struct StandardWorkloads {
    pub auth_inner: Arc<dyn Workload>,
    pub auth: Arc<dyn Workload>,
    pub query: Arc<dyn Workload>,
}

impl StandardWorkloads {
    pub fn from_config(config: &WorkloadsConfig) -> Self {
        Self {
            auth_inner: workload::from_config(&config.auth_inner),
            auth: workload::from_config(&config.auth),
            query: workload::from_config(&config.query),
        }
    }
}

/// Top-level stages in execution order: `auth` (with `auth_inner`), then `query`.
pub fn standard_pipeline(workloads: StandardWorkloads) -> Vec<Arc<Operation>> {
    let auth_inner = Arc::new(Operation::new(AUTH_INNER, workloads.auth_inner));
    let auth = Operation::new(AUTH, workloads.auth).with_prerequisite(auth_inner);
    let query = Operation::new(QUERY, workloads.query);
    vec![Arc::new(auth), Arc::new(query)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_shape() {
        let stages = standard_pipeline(StandardWorkloads::from_config(&WorkloadsConfig::default()));
        let names: Vec<_> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(names, [AUTH, QUERY]);

        let prerequisites: Vec<_> = stages[0].prerequisites().iter().map(|p| p.name()).collect();
        assert_eq!(prerequisites, [AUTH_INNER]);
        assert!(stages[1].prerequisites().is_empty());
    }
}
