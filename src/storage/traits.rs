//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and the
//! associated error types.

use crate::analysis::{AgentTally, ConflictRecord, CrossRefConflict, ExperimentalDirective, TypoCandidate};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for result store implementations
///
/// Every `record_*` call writes its whole batch in one transaction, so a
/// run either has a complete table or none of it.
pub trait AuditStore {
    // ===== Run Management =====

    /// Creates a new audit run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `snapshot_date` - Date folder of the audited snapshot
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, snapshot_date: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Results =====

    /// Stores conflicts and their evidence lines
    fn record_conflicts(&mut self, run_id: i64, conflicts: &[ConflictRecord]) -> StorageResult<()>;

    fn record_typos(&mut self, run_id: i64, typos: &[TypoCandidate]) -> StorageResult<()>;

    fn record_cross_refs(&mut self, run_id: i64, refs: &[CrossRefConflict]) -> StorageResult<()>;

    fn record_experimental(
        &mut self,
        run_id: i64,
        directives: &[ExperimentalDirective],
    ) -> StorageResult<()>;

    fn record_agent_tallies(&mut self, run_id: i64, tallies: &[AgentTally]) -> StorageResult<()>;

    // ===== Queries =====

    /// Counts conflicts stored for a run
    fn count_conflicts(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts evidence lines stored for a run
    fn count_evidence(&self, run_id: i64) -> StorageResult<u64>;

    fn count_typos(&self, run_id: i64) -> StorageResult<u64>;

    fn count_cross_refs(&self, run_id: i64) -> StorageResult<u64>;

    fn count_experimental(&self, run_id: i64) -> StorageResult<u64>;

    /// Loads a run's tallies in the order they were written
    fn get_agent_tallies(&self, run_id: i64) -> StorageResult<Vec<AgentTally>>;
}
