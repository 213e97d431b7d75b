//! Sumi-Audit: corpus-scale auditing of crawler permission files
//!
//! This crate parses `robots.txt` and `ai.txt` files into per-agent permission
//! records, diffs the two files, reports contradictions for AI crawlers,
//! flags misspelled crawler names, and checks `llms.txt` links against the
//! combined block-list.

pub mod analysis;
pub mod config;
pub mod directives;
pub mod output;
pub mod permissions;
pub mod pipeline;
pub mod snapshot;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Sumi-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error at {path}: {message}")]
    Snapshot { path: PathBuf, message: String },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to process {domain}: {message}")]
    Domain { domain: String, message: String },

    #[error("Worker pool error: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Sumi-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

// Re-export commonly used types
pub use analysis::{ConflictKind, ConflictRecord, CrossRefConflict, TypoCandidate};
pub use config::AuditConfig;
pub use directives::{build_rules, tokenize, Directive, DirectiveKind, PermissionRecord};
pub use permissions::{AgentVocabulary, DomainPermissions, PermissionMap, WILDCARD};
pub use pipeline::{run_audit, AuditResults, Coordinator};
pub use snapshot::SourceFile;
