//! Sumi-Audit main entry point
//!
//! This is the command-line interface for the Sumi-Audit permission file auditor.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_audit::config::{load_config_with_hash, AuditConfig};
use sumi_audit::output::print_manifest_statistics;
use sumi_audit::pipeline::Coordinator;
use sumi_audit::snapshot::{Manifest, ManifestStats};
use tracing_subscriber::EnvFilter;

/// Sumi-Audit: robots.txt / ai.txt / llms.txt consistency auditor
///
/// Sumi-Audit reads a downloaded snapshot of crawler permission files and
/// reports where robots.txt and ai.txt disagree for AI crawlers, likely
/// misspelled crawler names, experimental directives, and llms.txt links
/// that point at blocked paths.
#[derive(Parser, Debug)]
#[command(name = "sumi-audit")]
#[command(version = "1.0.0")]
#[command(about = "Audits crawler permission files across a snapshot", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what each stage would analyse without running it
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show manifest statistics and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| format!("invalid config {}", cli.config.display()));
        }
    };

    if cli.stats {
        handle_stats(&config)
    } else if cli.dry_run {
        handle_dry_run(config, config_hash)
    } else {
        handle_audit(config, config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_audit=info,warn"),
            1 => EnvFilter::new("sumi_audit=debug,info"),
            2 => EnvFilter::new("sumi_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: counts file combinations in the manifest
fn handle_stats(config: &AuditConfig) -> anyhow::Result<()> {
    println!("Manifest: {}\n", config.snapshot.manifest.display());

    let manifest = Manifest::load(&config.snapshot.manifest).context("failed to load manifest")?;
    print_manifest_statistics(&ManifestStats::from_manifest(&manifest));

    Ok(())
}

/// Handles the --dry-run mode: resolves the snapshot and shows stage sizes
fn handle_dry_run(config: AuditConfig, config_hash: String) -> anyhow::Result<()> {
    println!("=== Sumi-Audit Dry Run ===\n");

    println!("Audit Configuration:");
    println!("  Workers: {}", config.audit.workers);
    println!("  Typo threshold: {}", config.audit.typo_threshold);
    println!("  Include partial: {}", config.audit.include_partial);
    let vocabulary = config.audit.vocabulary();
    println!("  AI agents audited: {}", vocabulary.len());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Summary: {}", config.output.summary_path().display());
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path.display()),
        None => println!("  Database: disabled"),
    }

    let coordinator =
        Coordinator::new(config, config_hash).context("failed to open snapshot or manifest")?;
    let plan = coordinator.plan();

    println!("\nSnapshot {}:", plan.snapshot_date);
    println!("  Manifest domains: {}", plan.manifest_domains);
    println!("  Domain directories: {}", plan.snapshot_domains);

    println!("\nStages:");
    println!("  Permissions: {} domains", plan.permissions);
    println!("  Experimental directives: {} domains", plan.experimental);
    println!("  Cross-references: {} domains", plan.cross_references);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main audit run
async fn handle_audit(config: AuditConfig, config_hash: String) -> anyhow::Result<()> {
    let output_dir = config.output.directory.clone();
    let coordinator = Coordinator::new(config, config_hash).context("failed to start audit")?;
    let results = coordinator.execute().await.context("audit failed")?;

    tracing::info!(
        "Audit completed: {} conflicts, {} typos, {} blocked llms.txt links",
        results.conflicts.len(),
        results.typos.len(),
        results.cross_refs.len()
    );
    println!("✓ Reports written to: {}", output_dir.display());

    Ok(())
}
