//! Output module for audit reports
//!
//! This module handles:
//! - Writing the permission map and diff as pretty JSON
//! - Rendering the text reports (conflicts, typos, cross-references, ...)
//! - Generating the markdown run summary
//! - Printing manifest statistics

mod json;
mod markdown;
mod report;
pub mod stats;

pub use json::{to_json_string, write_json};
pub use markdown::{format_markdown_summary, generate_markdown_summary, AuditSummary};
pub use report::{
    format_agent_summary, format_conflict_report, format_cross_ref_report,
    format_experimental_report, format_typo_report, ConflictTotals,
};
pub use stats::{format_manifest_statistics, print_manifest_statistics};

use std::fs;
use std::path::Path;
use thiserror::Error;

pub const PERMISSIONS_MAP_FILE: &str = "permissions_map.json";
pub const PERMISSIONS_DIFF_FILE: &str = "permissions_diff.json";
pub const CONFLICTS_FILE: &str = "conflicts.txt";
pub const TYPOS_FILE: &str = "typos.txt";
pub const CROSS_REFERENCES_FILE: &str = "cross_references.txt";
pub const EXPERIMENTAL_FILE: &str = "experimental_directives.txt";
pub const AGENT_SUMMARY_FILE: &str = "agent_summary.txt";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a text artifact, creating parent directories as needed
pub fn write_text(path: &Path, content: &str) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
