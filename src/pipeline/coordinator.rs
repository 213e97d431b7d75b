//! Audit coordinator - run orchestration
//!
//! The coordinator owns everything a run needs:
//! - Opening the manifest and snapshot (fatal when missing)
//! - Selecting domains for each stage from the manifest
//! - Driving the worker pool through the permission, experimental and
//!   cross-reference stages
//! - Writing report artifacts and the optional SQLite record

use crate::analysis::{
    check_cross_references, diff_domain, scan_experimental, ConflictDetector, TypoDetector,
};
use crate::config::AuditConfig;
use crate::output::{
    format_agent_summary, format_conflict_report, format_cross_ref_report,
    format_experimental_report, format_typo_report, generate_markdown_summary, write_json,
    write_text, AuditSummary, ConflictTotals, AGENT_SUMMARY_FILE, CONFLICTS_FILE,
    CROSS_REFERENCES_FILE, EXPERIMENTAL_FILE, PERMISSIONS_DIFF_FILE, PERMISSIONS_MAP_FILE,
    TYPOS_FILE,
};
use crate::permissions::{AgentVocabulary, DomainPermissions};
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::results::{AuditResults, PermissionPartial, StageStats};
use crate::snapshot::{DomainSources, FileSet, Manifest, ManifestStats, Snapshot, SourceFile};
use crate::storage::{open_store, AuditStore, RunStatus, SqliteStore};
use crate::AuditError;
use chrono::NaiveDate;
use std::sync::Arc;

pub const PERMISSIONS_STAGE: &str = "permissions";
pub const EXPERIMENTAL_STAGE: &str = "experimental";
pub const CROSS_REFERENCE_STAGE: &str = "cross-references";

/// Domains each stage would analyse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub snapshot_date: NaiveDate,
    pub manifest_domains: usize,
    pub snapshot_domains: usize,
    pub permissions: usize,
    pub experimental: usize,
    pub cross_references: usize,
}

/// Main audit coordinator
pub struct Coordinator {
    config: AuditConfig,
    config_hash: String,
    manifest: Manifest,
    snapshot: Arc<Snapshot>,
    vocabulary: Arc<AgentVocabulary>,
    pool: WorkerPool,
}

impl Coordinator {
    /// Creates a coordinator for a validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The audit configuration
    /// * `config_hash` - Fingerprint of the configuration file
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Manifest loaded and snapshot indexed
    /// * `Err(AuditError)` - Manifest, snapshot root or dated folder missing
    pub fn new(config: AuditConfig, config_hash: impl Into<String>) -> Result<Self, AuditError> {
        let manifest = Manifest::load(&config.snapshot.manifest)?;
        tracing::info!(
            "Loaded manifest {} ({} domains)",
            config.snapshot.manifest.display(),
            manifest.len()
        );

        let snapshot = Snapshot::open(&config.snapshot.root, config.snapshot.date)?;
        let vocabulary = config.audit.vocabulary();
        let pool = WorkerPool::new(config.audit.workers);

        Ok(Self {
            config_hash: config_hash.into(),
            manifest,
            snapshot: Arc::new(snapshot),
            vocabulary: Arc::new(vocabulary),
            pool,
            config,
        })
    }

    pub fn snapshot_date(&self) -> NaiveDate {
        self.snapshot.date()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Counts the domains each stage selects without reading any file
    pub fn plan(&self) -> StagePlan {
        StagePlan {
            snapshot_date: self.snapshot.date(),
            manifest_domains: self.manifest.len(),
            snapshot_domains: self.snapshot.domain_count(),
            permissions: self
                .manifest
                .permission_domains(self.config.audit.include_partial)
                .len(),
            experimental: self.manifest.directive_domains().len(),
            cross_references: self.manifest.cross_reference_domains().len(),
        }
    }

    /// Runs every stage and returns the merged, ordered results
    pub async fn run(&self) -> Result<AuditResults, AuditError> {
        tracing::info!(
            "Starting audit of snapshot {} with {} workers",
            self.snapshot.date(),
            self.pool.workers()
        );
        let mut results = AuditResults::default();

        // Permission map, diff, conflicts, typos and agent tallies
        let selected = self
            .manifest
            .permission_domains(self.config.audit.include_partial);
        let count = selected.len();
        let snapshot = Arc::clone(&self.snapshot);
        let vocabulary = Arc::clone(&self.vocabulary);
        let threshold = self.config.audit.typo_threshold;
        let outcome = self
            .pool
            .run(PERMISSIONS_STAGE, selected, move |domain, files| {
                let sources = snapshot.load_sources(domain, permission_files(*files))?;
                analyse_permissions(&sources, &vocabulary, threshold)
            })
            .await?;
        results.stages.push(StageStats {
            stage: PERMISSIONS_STAGE.to_string(),
            selected: count,
            processed: outcome.processed,
            failed: outcome.failed,
        });
        let partial = outcome.partial;
        results.permissions = partial.map;
        results.diffs = partial.diffs;
        results.conflicts = partial.conflicts;
        results.typos = partial.typos;
        results.agents = partial.agents.finish();

        let selected = self.manifest.directive_domains();
        let count = selected.len();
        let snapshot = Arc::clone(&self.snapshot);
        let outcome = self
            .pool
            .run(EXPERIMENTAL_STAGE, selected, move |domain, files| {
                let sources = snapshot.load_sources(domain, permission_files(*files))?;
                Ok(scan_experimental(&sources))
            })
            .await?;
        results.stages.push(StageStats {
            stage: EXPERIMENTAL_STAGE.to_string(),
            selected: count,
            processed: outcome.processed,
            failed: outcome.failed,
        });
        results.experimental = outcome.partial;

        let selected = self.manifest.cross_reference_domains();
        let count = selected.len();
        let snapshot = Arc::clone(&self.snapshot);
        let outcome = self
            .pool
            .run(CROSS_REFERENCE_STAGE, selected, move |domain, files| {
                let sources = snapshot.load_sources(domain, *files)?;
                Ok(check_cross_references(&sources))
            })
            .await?;
        results.stages.push(StageStats {
            stage: CROSS_REFERENCE_STAGE.to_string(),
            selected: count,
            processed: outcome.processed,
            failed: outcome.failed,
        });
        results.cross_refs = outcome.partial;

        results.normalize();

        tracing::info!(
            "Audit finished: {} domains checked, {} conflicts in {} domains, {} typos, {} blocked links, {} experimental directives",
            results.domains_checked(),
            results.conflicts.len(),
            results.domains_with_conflicts(),
            results.typos.len(),
            results.cross_refs.len(),
            results.experimental.len()
        );
        Ok(results)
    }

    /// Builds the markdown summary data for a finished run
    pub fn summarize(&self, results: &AuditResults) -> AuditSummary {
        AuditSummary {
            snapshot_date: Some(self.snapshot.date()),
            config_hash: self.config_hash.clone(),
            manifest: ManifestStats::from_manifest(&self.manifest),
            stages: results.stages.clone(),
            domains_checked: results.domains_checked(),
            domains_with_conflicts: results.domains_with_conflicts(),
            conflicts: results.conflicts.len(),
            typos: results.typos.len(),
            cross_refs: results.cross_refs.len(),
            experimental: results.experimental.len(),
            top_agents: results.agents.clone(),
        }
    }

    /// Writes every report artifact into the output directory
    pub fn write_outputs(&self, results: &AuditResults) -> Result<(), AuditError> {
        let dir = &self.config.output.directory;
        let totals = ConflictTotals {
            domains_checked: results.domains_checked(),
            domains_with_conflicts: results.domains_with_conflicts(),
            consistent_domains: results.consistent_domains(),
        };

        write_json(&dir.join(PERMISSIONS_MAP_FILE), &results.permissions)?;
        write_json(&dir.join(PERMISSIONS_DIFF_FILE), &results.diffs)?;
        write_text(
            &dir.join(CONFLICTS_FILE),
            &format_conflict_report(&results.conflicts, totals),
        )?;
        write_text(&dir.join(TYPOS_FILE), &format_typo_report(&results.typos))?;
        write_text(
            &dir.join(CROSS_REFERENCES_FILE),
            &format_cross_ref_report(&results.cross_refs),
        )?;
        write_text(
            &dir.join(EXPERIMENTAL_FILE),
            &format_experimental_report(&results.experimental),
        )?;
        write_text(
            &dir.join(AGENT_SUMMARY_FILE),
            &format_agent_summary(&results.agents),
        )?;

        let summary_path = self.config.output.summary_path();
        generate_markdown_summary(&self.summarize(results), &summary_path)?;

        tracing::info!("Reports written to {}", dir.display());
        Ok(())
    }

    /// Runs the audit, writes the reports and records the run if a store is configured
    ///
    /// A run that fails after the store was opened is marked `failed`.
    pub async fn execute(&self) -> Result<AuditResults, AuditError> {
        let mut store = self.open_run()?;

        let outcome = self.run_and_write().await;
        let outcome = match (store.as_mut(), outcome) {
            (Some((store, run_id)), Ok(results)) => {
                match record_results(store, *run_id, &results) {
                    Ok(()) => Ok(results),
                    Err(e) => {
                        mark_failed(store, *run_id);
                        Err(e)
                    }
                }
            }
            (Some((store, run_id)), Err(e)) => {
                mark_failed(store, *run_id);
                Err(e)
            }
            (None, outcome) => outcome,
        };

        if let Err(e) = &outcome {
            tracing::error!("Audit failed: {}", e);
        }
        outcome
    }

    async fn run_and_write(&self) -> Result<AuditResults, AuditError> {
        let results = self.run().await?;
        self.write_outputs(&results)?;
        Ok(results)
    }

    fn open_run(&self) -> Result<Option<(SqliteStore, i64)>, AuditError> {
        let Some(path) = &self.config.output.database_path else {
            return Ok(None);
        };
        let mut store = open_store(path)?;
        let run_id = store.create_run(&self.config_hash, &self.snapshot.date().to_string())?;
        tracing::info!("Recording run {} in {}", run_id, path.display());
        Ok(Some((store, run_id)))
    }
}

/// Restricts a manifest entry to the two permission files
fn permission_files(files: FileSet) -> FileSet {
    let listed: Vec<SourceFile> = SourceFile::PERMISSION_FILES
        .into_iter()
        .filter(|file| files.contains(*file))
        .collect();
    FileSet::of(&listed)
}

/// Per-domain work of the permission stage
fn analyse_permissions(
    sources: &DomainSources,
    vocabulary: &AgentVocabulary,
    typo_threshold: f64,
) -> Result<PermissionPartial, AuditError> {
    let domain = sources.domain.as_str();
    let permissions = DomainPermissions::from_sources(sources)?;

    let mut partial = PermissionPartial::default();
    partial.diffs.insert(domain, diff_domain(&permissions));
    partial.conflicts = ConflictDetector::new(vocabulary).detect(&permissions, sources);
    partial.typos =
        TypoDetector::with_threshold(vocabulary, typo_threshold).detect(domain, &permissions);
    partial.agents.add_domain(&permissions);
    partial.agents.add_conflicts(&partial.conflicts);
    partial.map.insert(domain, permissions);

    Ok(partial)
}

fn record_results(
    store: &mut SqliteStore,
    run_id: i64,
    results: &AuditResults,
) -> Result<(), AuditError> {
    store.record_conflicts(run_id, &results.conflicts)?;
    store.record_typos(run_id, &results.typos)?;
    store.record_cross_refs(run_id, &results.cross_refs)?;
    store.record_experimental(run_id, &results.experimental)?;
    store.record_agent_tallies(run_id, &results.agents)?;
    store.complete_run(run_id)?;
    tracing::info!("Run {} recorded", run_id);
    Ok(())
}

fn mark_failed(store: &mut SqliteStore, run_id: i64) {
    if let Err(e) = store.update_run_status(run_id, RunStatus::Failed) {
        tracing::warn!("Could not mark run {} as failed: {}", run_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "User-agent: GPTBot\nDisallow: /private\n";
    const AI: &str = "User-agent: GPTBot\nAllow: /private\n\nUser-agent: GPTB0T\nDisallow: /\n";

    #[test]
    fn test_permission_files_drops_llms() {
        let files = FileSet::of(&[SourceFile::Robots, SourceFile::Llms]);
        let kept = permission_files(files);
        assert!(kept.contains(SourceFile::Robots));
        assert!(!kept.contains(SourceFile::Ai));
        assert!(!kept.contains(SourceFile::Llms));
    }

    #[test]
    fn test_analyse_permissions() {
        let sources = DomainSources::new("example.com")
            .with(SourceFile::Robots, ROBOTS)
            .with(SourceFile::Ai, AI);
        let vocabulary = AgentVocabulary::builtin();
        let partial = analyse_permissions(&sources, &vocabulary, 0.6).unwrap();

        assert_eq!(partial.map.len(), 1);
        assert_eq!(partial.diffs.len(), 1);
        assert_eq!(partial.conflicts.len(), 1);
        assert_eq!(partial.conflicts[0].agent, "GPTBot");
        assert_eq!(partial.conflicts[0].path, "/private");
        assert_eq!(partial.typos.len(), 1);
        assert_eq!(partial.typos[0].declared_agent, "GPTB0T");

        let tallies = partial.agents.finish();
        let gptbot = tallies.iter().find(|t| t.agent == "GPTBot").unwrap();
        assert_eq!(gptbot.conflict_count, 1);
        assert_eq!(gptbot.robots_disallow_present, 1);
        assert_eq!(gptbot.ai_allow_present, 1);
    }
}
