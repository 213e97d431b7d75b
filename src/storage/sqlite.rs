//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the AuditStore trait.

use crate::analysis::{AgentTally, ConflictRecord, CrossRefConflict, ExperimentalDirective, TypoCandidate};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AuditStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::AuditError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, snapshot_date, status";

/// SQLite result store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(AuditError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        snapshot_date: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
    })
}

impl AuditStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, snapshot_date: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, snapshot_date, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, snapshot_date, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        Ok(self.conn.query_row(&sql, [], run_from_row).optional()?)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Results =====

    fn record_conflicts(&mut self, run_id: i64, conflicts: &[ConflictRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_conflict = tx.prepare(
                "INSERT INTO conflicts (run_id, domain, agent, path, kind, robots_allows, ai_allows)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let mut insert_evidence = tx.prepare(
                "INSERT INTO conflict_evidence (conflict_id, position, file, line, raw_text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for conflict in conflicts {
                let conflict_id = insert_conflict.insert(params![
                    run_id,
                    conflict.domain,
                    conflict.agent,
                    conflict.path,
                    conflict.kind.as_str(),
                    conflict.effective.map(|e| e.robots_allows),
                    conflict.effective.map(|e| e.ai_allows),
                ])?;

                for (position, evidence) in conflict.evidence.iter().enumerate() {
                    insert_evidence.execute(params![
                        conflict_id,
                        position as i64,
                        evidence.file.file_name(),
                        evidence.line as i64,
                        evidence.raw_text,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn record_typos(&mut self, run_id: i64, typos: &[TypoCandidate]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO typos (run_id, domain, file, declared_agent, suggested_agent, similarity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for typo in typos {
                stmt.execute(params![
                    run_id,
                    typo.domain,
                    typo.file.file_name(),
                    typo.declared_agent,
                    typo.suggested_known_agent,
                    typo.similarity_score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn record_cross_refs(&mut self, run_id: i64, refs: &[CrossRefConflict]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cross_refs (run_id, domain, line, link, blocking_file, blocking_directive)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for conflict in refs {
                stmt.execute(params![
                    run_id,
                    conflict.domain,
                    conflict.line as i64,
                    conflict.link,
                    conflict.blocking_file.file_name(),
                    conflict.blocking_directive.label(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn record_experimental(
        &mut self,
        run_id: i64,
        directives: &[ExperimentalDirective],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO experimental_directives (run_id, domain, file, directive, value, line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for directive in directives {
                stmt.execute(params![
                    run_id,
                    directive.domain,
                    directive.file.file_name(),
                    directive.directive.label(),
                    directive.value,
                    directive.line as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn record_agent_tallies(&mut self, run_id: i64, tallies: &[AgentTally]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO agent_tallies
                 (run_id, agent, robots_allow, robots_disallow, ai_allow, ai_disallow, conflicts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for tally in tallies {
                stmt.execute(params![
                    run_id,
                    tally.agent,
                    tally.robots_allow_present as i64,
                    tally.robots_disallow_present as i64,
                    tally.ai_allow_present as i64,
                    tally.ai_disallow_present as i64,
                    tally.conflict_count as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Queries =====

    fn count_conflicts(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM conflicts WHERE run_id = ?1", run_id)
    }

    fn count_evidence(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM conflict_evidence e
             JOIN conflicts c ON c.id = e.conflict_id
             WHERE c.run_id = ?1",
            run_id,
        )
    }

    fn count_typos(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM typos WHERE run_id = ?1", run_id)
    }

    fn count_cross_refs(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM cross_refs WHERE run_id = ?1", run_id)
    }

    fn count_experimental(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM experimental_directives WHERE run_id = ?1",
            run_id,
        )
    }

    fn get_agent_tallies(&self, run_id: i64) -> StorageResult<Vec<AgentTally>> {
        let mut stmt = self.conn.prepare(
            "SELECT agent, robots_allow, robots_disallow, ai_allow, ai_disallow, conflicts
             FROM agent_tallies WHERE run_id = ?1 ORDER BY id",
        )?;

        let tallies = stmt
            .query_map(params![run_id], |row| {
                Ok(AgentTally {
                    agent: row.get(0)?,
                    robots_allow_present: row.get::<_, i64>(1)? as u64,
                    robots_disallow_present: row.get::<_, i64>(2)? as u64,
                    ai_allow_present: row.get::<_, i64>(3)? as u64,
                    ai_disallow_present: row.get::<_, i64>(4)? as u64,
                    conflict_count: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tallies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ConflictKind, EffectiveAccess, Evidence};
    use crate::directives::DirectiveKind;
    use crate::snapshot::SourceFile;

    fn conflict() -> ConflictRecord {
        ConflictRecord {
            domain: "example.com".to_string(),
            agent: "GPTBot".to_string(),
            path: "/private".to_string(),
            kind: ConflictKind::AiAllowsRobotsDisallows,
            evidence: vec![
                Evidence {
                    file: SourceFile::Ai,
                    line: 2,
                    raw_text: "Allow: /private".to_string(),
                },
                Evidence {
                    file: SourceFile::Robots,
                    line: 2,
                    raw_text: "Disallow: /private".to_string(),
                },
            ],
            effective: Some(EffectiveAccess {
                robots_allows: false,
                ai_allows: true,
            }),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let store = SqliteStore::new_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_run_lifecycle() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("test_hash", "2024-06-01").unwrap();
        assert!(run_id > 0);

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.snapshot_date, "2024-06-01");
        assert!(run.finished_at.is_none());

        store.complete_run(run_id).unwrap();
        let run = store.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_missing_run() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        assert!(matches!(store.get_run(42), Err(StorageError::RunNotFound(42))));
        assert!(matches!(
            store.update_run_status(42, RunStatus::Failed),
            Err(StorageError::RunNotFound(42))
        ));
        assert!(store.get_latest_run().unwrap().is_none());
    }

    #[test]
    fn test_record_conflicts_with_evidence() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("h", "2024-06-01").unwrap();

        store.record_conflicts(run_id, &[conflict(), conflict()]).unwrap();
        assert_eq!(store.count_conflicts(run_id).unwrap(), 2);
        assert_eq!(store.count_evidence(run_id).unwrap(), 4);
    }

    #[test]
    fn test_record_other_results() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("h", "2024-06-01").unwrap();

        store
            .record_typos(
                run_id,
                &[TypoCandidate {
                    domain: "example.com".to_string(),
                    file: SourceFile::Ai,
                    declared_agent: "GPTB0T".to_string(),
                    suggested_known_agent: "gptbot".to_string(),
                    similarity_score: 0.83,
                }],
            )
            .unwrap();
        store
            .record_cross_refs(
                run_id,
                &[CrossRefConflict {
                    domain: "example.com".to_string(),
                    line: 3,
                    link: "/private/a".to_string(),
                    blocking_file: SourceFile::Robots,
                    blocking_directive: DirectiveKind::Disallow,
                }],
            )
            .unwrap();
        store
            .record_experimental(
                run_id,
                &[ExperimentalDirective {
                    domain: "example.com".to_string(),
                    file: SourceFile::Robots,
                    directive: DirectiveKind::ContentUsage,
                    value: "train-ai=n".to_string(),
                    line: 4,
                }],
            )
            .unwrap();

        assert_eq!(store.count_typos(run_id).unwrap(), 1);
        assert_eq!(store.count_cross_refs(run_id).unwrap(), 1);
        assert_eq!(store.count_experimental(run_id).unwrap(), 1);
    }

    #[test]
    fn test_agent_tallies_roundtrip_in_order() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("h", "2024-06-01").unwrap();

        let tallies = vec![
            AgentTally {
                agent: "GPTBot".to_string(),
                robots_disallow_present: 3,
                ai_allow_present: 1,
                conflict_count: 2,
                ..AgentTally::default()
            },
            AgentTally {
                agent: "*".to_string(),
                robots_allow_present: 5,
                ..AgentTally::default()
            },
        ];
        store.record_agent_tallies(run_id, &tallies).unwrap();

        assert_eq!(store.get_agent_tallies(run_id).unwrap(), tallies);
    }

    #[test]
    fn test_runs_are_isolated() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let first = store.create_run("h", "2024-06-01").unwrap();
        let second = store.create_run("h", "2024-06-02").unwrap();

        store.record_conflicts(first, &[conflict()]).unwrap();
        assert_eq!(store.count_conflicts(first).unwrap(), 1);
        assert_eq!(store.count_conflicts(second).unwrap(), 0);
    }
}
