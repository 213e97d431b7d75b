//! Storage module for persisting audit results
//!
//! This module keeps an optional SQLite record of every audit run:
//! - run bookkeeping (timestamps, config hash, snapshot date, status)
//! - conflicts with their evidence lines
//! - typo candidates, cross-reference conflicts and experimental directives
//! - the per-agent tallies

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{AuditStore, StorageError, StorageResult};

use crate::AuditError;
use std::path::Path;

/// Opens (creating if needed) a result store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Store opened and schema ensured
/// * `Err(AuditError)` - Failed to open the database
pub fn open_store(path: &Path) -> Result<SqliteStore, AuditError> {
    SqliteStore::new(path)
}

/// Represents an audit run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub snapshot_date: String,
    pub status: RunStatus,
}

/// Status of an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
