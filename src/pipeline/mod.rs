//! Audit pipeline
//!
//! This module contains:
//! - The bounded worker pool that analyses domains in parallel
//! - The partial and merged result types
//! - The coordinator driving a full run

mod coordinator;
mod pool;
mod results;

pub use coordinator::{
    Coordinator, StagePlan, CROSS_REFERENCE_STAGE, EXPERIMENTAL_STAGE, PERMISSIONS_STAGE,
};
pub use pool::{Partial, StageOutcome, WorkerPool};
pub use results::{AuditResults, PermissionPartial, StageStats};

use crate::config::AuditConfig;
use crate::AuditError;

/// Main entry point for running an audit
///
/// # Arguments
///
/// * `config` - The audit configuration
/// * `config_hash` - Fingerprint of the configuration file
///
/// # Returns
///
/// * `Ok(AuditResults)` - Audit completed and reports written
/// * `Err(AuditError)` - Startup failed or reports could not be written
pub async fn run_audit(
    config: AuditConfig,
    config_hash: impl Into<String>,
) -> Result<AuditResults, AuditError> {
    let coordinator = Coordinator::new(config, config_hash)?;
    coordinator.execute().await
}
