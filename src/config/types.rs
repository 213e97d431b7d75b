use crate::analysis::DEFAULT_TYPO_THRESHOLD;
use crate::permissions::AgentVocabulary;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Sumi-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub audit: AuditSettings,
    pub output: OutputConfig,
}

/// Where the downloaded corpus lives
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Directory holding `YYYY-MM-DD` snapshot folders
    pub root: PathBuf,

    /// CSV listing which files each domain has
    pub manifest: PathBuf,

    /// Audit this snapshot instead of the latest one (`"YYYY-MM-DD"`)
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Analysis tuning
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    /// Number of blocking workers analysing domains in parallel
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Minimum similarity for a typo suggestion
    #[serde(rename = "typo-threshold", default = "default_typo_threshold")]
    pub typo_threshold: f64,

    /// Feed domains with only one permission file to the permission stages
    #[serde(rename = "include-partial", default)]
    pub include_partial: bool,

    /// Replaces the built-in AI-crawler vocabulary
    #[serde(rename = "ai-agents", default)]
    pub ai_agents: Option<Vec<String>>,
}

impl AuditSettings {
    /// The crawler vocabulary to audit against
    pub fn vocabulary(&self) -> AgentVocabulary {
        match &self.ai_agents {
            Some(agents) => AgentVocabulary::new(agents),
            None => AgentVocabulary::builtin(),
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            typo_threshold: default_typo_threshold(),
            include_partial: false,
            ai_agents: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(256)
}

fn default_typo_threshold() -> f64 {
    DEFAULT_TYPO_THRESHOLD
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the report files
    pub directory: PathBuf,

    /// Path to the SQLite result store (disabled when absent)
    #[serde(rename = "database-path", default)]
    pub database_path: Option<PathBuf>,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<PathBuf>,
}

impl OutputConfig {
    /// Summary location, defaulting to `summary.md` in the output directory
    pub fn summary_path(&self) -> PathBuf {
        self.summary_path
            .clone()
            .unwrap_or_else(|| self.directory.join("summary.md"))
    }
}
