//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Audit result store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track audit runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    snapshot_date TEXT NOT NULL,
    status TEXT NOT NULL
);

-- robots.txt / ai.txt contradictions
CREATE TABLE IF NOT EXISTS conflicts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    domain TEXT NOT NULL,
    agent TEXT NOT NULL,
    path TEXT NOT NULL,
    kind TEXT NOT NULL,
    robots_allows INTEGER,
    ai_allows INTEGER
);

CREATE INDEX IF NOT EXISTS idx_conflicts_run ON conflicts(run_id);
CREATE INDEX IF NOT EXISTS idx_conflicts_domain ON conflicts(domain);
CREATE INDEX IF NOT EXISTS idx_conflicts_agent ON conflicts(agent);

-- Source lines backing each conflict
CREATE TABLE IF NOT EXISTS conflict_evidence (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conflict_id INTEGER NOT NULL REFERENCES conflicts(id),
    position INTEGER NOT NULL,
    file TEXT NOT NULL,
    line INTEGER NOT NULL,
    raw_text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_evidence_conflict ON conflict_evidence(conflict_id);

-- Misspelled crawler declarations
CREATE TABLE IF NOT EXISTS typos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    domain TEXT NOT NULL,
    file TEXT NOT NULL,
    declared_agent TEXT NOT NULL,
    suggested_agent TEXT NOT NULL,
    similarity REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_typos_run ON typos(run_id);

-- llms.txt links blocked by a permission file
CREATE TABLE IF NOT EXISTS cross_refs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    domain TEXT NOT NULL,
    line INTEGER NOT NULL,
    link TEXT NOT NULL,
    blocking_file TEXT NOT NULL,
    blocking_directive TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cross_refs_run ON cross_refs(run_id);

-- DisallowAITraining / Content-Usage declarations
CREATE TABLE IF NOT EXISTS experimental_directives (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    domain TEXT NOT NULL,
    file TEXT NOT NULL,
    directive TEXT NOT NULL,
    value TEXT NOT NULL,
    line INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_experimental_run ON experimental_directives(run_id);

-- Corpus-wide per-agent counters
CREATE TABLE IF NOT EXISTS agent_tallies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    agent TEXT NOT NULL,
    robots_allow INTEGER NOT NULL,
    robots_disallow INTEGER NOT NULL,
    ai_allow INTEGER NOT NULL,
    ai_disallow INTEGER NOT NULL,
    conflicts INTEGER NOT NULL,
    UNIQUE(run_id, agent)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
