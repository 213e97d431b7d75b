//! Markdown summary generation
//!
//! This module renders the run summary: the snapshot used, manifest
//! coverage, per-stage domain counts, finding totals and the agents with the
//! most conflicts. The summary carries no timestamps, so repeated runs over
//! the same snapshot produce identical files.

use crate::analysis::AgentTally;
use crate::output::{write_text, OutputResult};
use crate::pipeline::StageStats;
use crate::snapshot::ManifestStats;
use chrono::NaiveDate;
use std::path::Path;

/// Agents listed in the summary table
const TOP_AGENTS: usize = 20;

/// Everything the markdown summary reports
#[derive(Debug, Clone, Default)]
pub struct AuditSummary {
    pub snapshot_date: Option<NaiveDate>,
    pub config_hash: String,
    pub manifest: ManifestStats,
    pub stages: Vec<StageStats>,
    pub domains_checked: usize,
    pub domains_with_conflicts: usize,
    pub conflicts: usize,
    pub typos: usize,
    pub cross_refs: usize,
    pub experimental: usize,
    pub top_agents: Vec<AgentTally>,
}

/// Generates a markdown summary file
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &AuditSummary, output_path: &Path) -> OutputResult<()> {
    write_text(output_path, &format_markdown_summary(summary))
}

/// Formats a run summary as markdown
///
/// # Arguments
///
/// * `summary` - The run summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &AuditSummary) -> String {
    let mut md = String::new();

    md.push_str("# Sumi Audit Summary\n\n");

    md.push_str("## Run Information\n\n");
    match summary.snapshot_date {
        Some(date) => md.push_str(&format!("- **Snapshot**: {}\n", date)),
        None => md.push_str("- **Snapshot**: unknown\n"),
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    let m = &summary.manifest;
    md.push_str("## Manifest Coverage\n\n");
    md.push_str("| Files | Domains |\n");
    md.push_str("|-------|---------|\n");
    md.push_str(&format!("| Total | {} |\n", m.total));
    md.push_str(&format!("| None | {} |\n", m.none));
    md.push_str(&format!("| robots.txt | {} |\n", m.robots));
    md.push_str(&format!("| ai.txt | {} |\n", m.ai));
    md.push_str(&format!("| llms.txt | {} |\n", m.llms));
    md.push_str(&format!("| robots.txt + ai.txt | {} |\n", m.robots_and_ai));
    md.push_str(&format!("| robots.txt + llms.txt | {} |\n", m.robots_and_llms));
    md.push_str(&format!("| ai.txt + llms.txt | {} |\n\n", m.ai_and_llms));

    if !summary.stages.is_empty() {
        md.push_str("## Stages\n\n");
        md.push_str("| Stage | Selected | Processed | Failed |\n");
        md.push_str("|-------|----------|-----------|--------|\n");
        for stage in &summary.stages {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                stage.stage, stage.selected, stage.processed, stage.failed
            ));
        }
        md.push('\n');
    }

    md.push_str("## Findings\n\n");
    md.push_str(&format!(
        "- **Domains Checked**: {}\n",
        summary.domains_checked
    ));
    md.push_str(&format!(
        "- **Domains With Conflicts**: {}\n",
        summary.domains_with_conflicts
    ));
    md.push_str(&format!("- **Conflicts**: {}\n", summary.conflicts));
    md.push_str(&format!("- **Possible Typos**: {}\n", summary.typos));
    md.push_str(&format!(
        "- **Blocked llms.txt Links**: {}\n",
        summary.cross_refs
    ));
    md.push_str(&format!(
        "- **Experimental Directives**: {}\n\n",
        summary.experimental
    ));

    if !summary.top_agents.is_empty() {
        md.push_str(&format!("## Top {} Agents\n\n", TOP_AGENTS));
        md.push_str("| Agent | robots Allow | robots Disallow | ai Allow | ai Disallow | Conflicts |\n");
        md.push_str("|-------|--------------|-----------------|----------|-------------|-----------|\n");
        for tally in summary.top_agents.iter().take(TOP_AGENTS) {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                tally.agent,
                tally.robots_allow_present,
                tally.robots_disallow_present,
                tally.ai_allow_present,
                tally.ai_disallow_present,
                tally.conflict_count
            ));
        }
        if summary.top_agents.len() > TOP_AGENTS {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.top_agents.len() - TOP_AGENTS
            ));
        }
        md.push('\n');
    }

    md
}
