//! Configuration module for Sumi-Audit
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Auditing snapshots under {}", config.snapshot.root.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AuditConfig, AuditSettings, OutputConfig, SnapshotConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::MAX_WORKERS;
