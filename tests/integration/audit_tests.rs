//! Integration tests for the audit pipeline
//!
//! These tests build a small snapshot tree on disk and drive the full
//! coordinator over it end-to-end.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use sumi_audit::config::{AuditConfig, AuditSettings, OutputConfig, SnapshotConfig};
use sumi_audit::output::{
    AGENT_SUMMARY_FILE, CONFLICTS_FILE, CROSS_REFERENCES_FILE, EXPERIMENTAL_FILE,
    PERMISSIONS_DIFF_FILE, PERMISSIONS_MAP_FILE, TYPOS_FILE,
};
use sumi_audit::pipeline::{Coordinator, EXPERIMENTAL_STAGE, PERMISSIONS_STAGE};
use sumi_audit::storage::{AuditStore, RunStatus, SqliteStore};
use sumi_audit::{AuditError, ConflictKind, DirectiveKind, PermissionMap, SourceFile};
use tempfile::TempDir;

const MANIFEST: &str = "domain,files\n\
    broken.io,robots.txt;ai.txt\n\
    example.com,robots.txt;ai.txt;llms.txt\n\
    exp.net,robots.txt\n\
    typo.org,robots.txt;ai.txt\n";

const ARTIFACTS: [&str; 8] = [
    PERMISSIONS_MAP_FILE,
    PERMISSIONS_DIFF_FILE,
    CONFLICTS_FILE,
    TYPOS_FILE,
    CROSS_REFERENCES_FILE,
    EXPERIMENTAL_FILE,
    AGENT_SUMMARY_FILE,
    "summary.md",
];

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Creates a snapshot with one conflicting, one misspelled, one
/// experimental-only and one unreadable domain
fn create_test_snapshot(root: &Path) {
    let split = root.join("snapshot/2024-06-01/files/split_00000");

    write(
        &split.join("example.com/robots.txt"),
        "User-agent: GPTBot\nDisallow: /private\n",
    );
    write(
        &split.join("example.com/ai.txt"),
        "User-agent: GPTBot\nAllow: /private\n",
    );
    write(
        &split.join("example.com/llms.txt"),
        "# Example\n- [Docs](/private/docs)\n- [Blog](https://example.com/blog)\n",
    );

    write(&split.join("typo.org/robots.txt"), "User-agent: *\nDisallow:\n");
    write(&split.join("typo.org/ai.txt"), "User-agent: GPTB0T\nDisallow: /\n");

    write(
        &split.join("exp.net/robots.txt"),
        "User-agent: *\nDisallowAITraining: /\nContent-Usage: train-ai=n\n",
    );

    // A directory where a file should be makes the read fail
    fs::create_dir_all(split.join("broken.io/robots.txt")).unwrap();
    write(&split.join("broken.io/ai.txt"), "User-agent: *\nDisallow: /\n");

    // Older snapshot that must be ignored
    write(
        &root.join("snapshot/2024-05-01/files/split_00000/example.com/robots.txt"),
        "User-agent: *\nDisallow: /\n",
    );

    write(&root.join("domain_files_map.csv"), MANIFEST);
}

fn create_test_config(root: &Path, output: &str, database: Option<PathBuf>) -> AuditConfig {
    AuditConfig {
        snapshot: SnapshotConfig {
            root: root.join("snapshot"),
            manifest: root.join("domain_files_map.csv"),
            date: None,
        },
        audit: AuditSettings {
            workers: 2,
            ..AuditSettings::default()
        },
        output: OutputConfig {
            directory: root.join(output),
            database_path: database,
            summary_path: None,
        },
    }
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn test_full_audit() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let config = create_test_config(dir.path(), "out", None);

    let coordinator = Coordinator::new(config, "hash").unwrap();
    assert_eq!(
        coordinator.snapshot_date(),
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    );
    let results = coordinator.execute().await.unwrap();

    // Conflicts
    assert_eq!(results.conflicts.len(), 1);
    let conflict = &results.conflicts[0];
    assert_eq!(conflict.domain, "example.com");
    assert_eq!(conflict.agent, "GPTBot");
    assert_eq!(conflict.path, "/private");
    assert_eq!(conflict.kind, ConflictKind::AiAllowsRobotsDisallows);
    assert_eq!(conflict.evidence.len(), 2);
    assert_eq!(conflict.evidence[0].file, SourceFile::Ai);
    assert_eq!(conflict.evidence[1].file, SourceFile::Robots);
    assert_eq!(conflict.evidence[1].line, 2);
    assert_eq!(results.domains_checked(), 2);
    assert_eq!(results.consistent_domains(), 1);

    // Typos
    assert_eq!(results.typos.len(), 1);
    assert_eq!(results.typos[0].domain, "typo.org");
    assert_eq!(results.typos[0].declared_agent, "GPTB0T");
    assert_eq!(results.typos[0].suggested_known_agent, "gptbot");
    assert_eq!(results.typos[0].file, SourceFile::Ai);

    // Cross-references
    assert_eq!(results.cross_refs.len(), 1);
    assert_eq!(results.cross_refs[0].domain, "example.com");
    assert_eq!(results.cross_refs[0].line, 2);
    assert_eq!(results.cross_refs[0].link, "/private/docs");
    assert_eq!(results.cross_refs[0].blocking_file, SourceFile::Robots);

    // Experimental directives
    assert_eq!(results.experimental.len(), 2);
    assert!(results.experimental.iter().all(|e| e.domain == "exp.net"));
    assert_eq!(
        results.experimental[0].directive,
        DirectiveKind::ExperimentalTrainingOptOut
    );

    // Agent tallies lead with the conflicting agent
    assert_eq!(results.agents[0].agent, "GPTBot");
    assert_eq!(results.agents[0].conflict_count, 1);

    // Artifacts
    let out = dir.path().join("out");
    for name in ARTIFACTS {
        assert!(out.join(name).is_file(), "missing {}", name);
    }
    let conflicts = read(&out, CONFLICTS_FILE);
    assert!(conflicts.contains("Domains checked:        2"));
    assert!(conflicts.contains("ai.txt:2"));
    assert!(conflicts.contains("robots.txt:2"));
    assert!(conflicts.contains("robots=deny ai=allow"));

    let map = PermissionMap::load(&out.join(PERMISSIONS_MAP_FILE)).unwrap();
    assert_eq!(map.len(), 2);
    assert!(map.get("example.com").is_some());
    assert!(map.get("broken.io").is_none());

    let summary = read(&out, "summary.md");
    assert!(summary.contains("- **Snapshot**: 2024-06-01"));
    assert!(summary.contains("- **Config Hash**: hash"));
    assert!(summary.contains("| Total | 4 |"));
}

#[tokio::test]
async fn test_failing_domain_is_isolated() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let config = create_test_config(dir.path(), "out", None);

    let results = Coordinator::new(config, "hash")
        .unwrap()
        .execute()
        .await
        .unwrap();

    let permissions = results.stage(PERMISSIONS_STAGE).unwrap();
    assert_eq!(permissions.selected, 3);
    assert_eq!(permissions.processed, 2);
    assert_eq!(permissions.failed, 1);

    let experimental = results.stage(EXPERIMENTAL_STAGE).unwrap();
    assert_eq!(experimental.selected, 4);
    assert_eq!(experimental.failed, 1);

    let summary = read(&dir.path().join("out"), "summary.md");
    assert!(summary.contains("| permissions | 3 | 2 | 1 |"));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());

    for output in ["first", "second"] {
        let config = create_test_config(dir.path(), output, None);
        Coordinator::new(config, "hash")
            .unwrap()
            .execute()
            .await
            .unwrap();
    }

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    for name in ARTIFACTS {
        assert_eq!(
            fs::read(first.join(name)).unwrap(),
            fs::read(second.join(name)).unwrap(),
            "{} differs between runs",
            name
        );
    }
}

#[tokio::test]
async fn test_worker_count_does_not_change_output() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());

    for (output, workers) in [("one", 1), ("many", 8)] {
        let mut config = create_test_config(dir.path(), output, None);
        config.audit.workers = workers;
        Coordinator::new(config, "hash")
            .unwrap()
            .execute()
            .await
            .unwrap();
    }

    assert_eq!(
        read(&dir.path().join("one"), CONFLICTS_FILE),
        read(&dir.path().join("many"), CONFLICTS_FILE)
    );
    assert_eq!(
        read(&dir.path().join("one"), PERMISSIONS_DIFF_FILE),
        read(&dir.path().join("many"), PERMISSIONS_DIFF_FILE)
    );
}

#[tokio::test]
async fn test_results_recorded_in_store() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let db_path = dir.path().join("audit.db");
    let config = create_test_config(dir.path(), "out", Some(db_path.clone()));

    Coordinator::new(config, "hash")
        .unwrap()
        .execute()
        .await
        .unwrap();

    let store = SqliteStore::new(&db_path).unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash");
    assert_eq!(run.snapshot_date, "2024-06-01");
    assert!(run.finished_at.is_some());

    assert_eq!(store.count_conflicts(run.id).unwrap(), 1);
    assert_eq!(store.count_evidence(run.id).unwrap(), 2);
    assert_eq!(store.count_typos(run.id).unwrap(), 1);
    assert_eq!(store.count_cross_refs(run.id).unwrap(), 1);
    assert_eq!(store.count_experimental(run.id).unwrap(), 2);
    let tallies = store.get_agent_tallies(run.id).unwrap();
    assert!(tallies.iter().any(|t| t.agent == "GPTBot" && t.conflict_count == 1));
}

#[tokio::test]
async fn test_failed_run_is_marked() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let db_path = dir.path().join("audit.db");
    // A regular file where the output directory should go
    fs::write(dir.path().join("blocked"), "not a directory").unwrap();
    let config = create_test_config(dir.path(), "blocked", Some(db_path.clone()));

    let result = Coordinator::new(config, "hash").unwrap().execute().await;
    assert!(matches!(result, Err(AuditError::Output(_))));

    let store = SqliteStore::new(&db_path).unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[test]
fn test_pinned_snapshot_date() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let mut config = create_test_config(dir.path(), "out", None);
    config.snapshot.date = NaiveDate::from_ymd_opt(2024, 5, 1);

    let coordinator = Coordinator::new(config, "hash").unwrap();
    let plan = coordinator.plan();
    assert_eq!(plan.snapshot_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    assert_eq!(plan.snapshot_domains, 1);
    assert_eq!(plan.permissions, 3);
    assert_eq!(plan.experimental, 4);
    assert_eq!(plan.cross_references, 1);
}

#[tokio::test]
async fn test_include_partial_widens_permission_stage() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let mut config = create_test_config(dir.path(), "out", None);
    config.audit.include_partial = true;

    let results = Coordinator::new(config, "hash")
        .unwrap()
        .execute()
        .await
        .unwrap();
    assert_eq!(results.stage(PERMISSIONS_STAGE).unwrap().selected, 4);
    assert!(results.permissions.get("exp.net").is_some());
}

#[test]
fn test_missing_manifest_is_fatal() {
    let dir = TempDir::new().unwrap();
    create_test_snapshot(dir.path());
    let mut config = create_test_config(dir.path(), "out", None);
    config.snapshot.manifest = dir.path().join("missing.csv");

    let result = Coordinator::new(config, "hash");
    assert!(matches!(result, Err(AuditError::Manifest(_))));
}

#[test]
fn test_missing_snapshot_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("domain_files_map.csv"), MANIFEST);
    let config = create_test_config(dir.path(), "out", None);

    let result = Coordinator::new(config, "hash");
    assert!(matches!(result, Err(AuditError::Snapshot { .. })));
}
