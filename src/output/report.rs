//! Plain-text report rendering
//!
//! Every report is a header row, a rule, then one row per record in the
//! order given. Callers sort before rendering.

use crate::analysis::{
    AgentTally, ConflictRecord, CrossRefConflict, ExperimentalDirective, TypoCandidate,
};

/// Headline counts printed above the conflict listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictTotals {
    pub domains_checked: usize,
    pub domains_with_conflicts: usize,
    pub consistent_domains: usize,
}

fn verdict(allowed: bool) -> &'static str {
    if allowed {
        "allow"
    } else {
        "deny"
    }
}

/// Formats the conflict drill-down
///
/// # Arguments
///
/// * `conflicts` - Sorted conflict records
/// * `totals` - Domain counts for the header
///
/// # Returns
///
/// The report text, one block per conflict with its evidence lines indented
pub fn format_conflict_report(conflicts: &[ConflictRecord], totals: ConflictTotals) -> String {
    let mut out = String::new();

    out.push_str(&format!("Domains checked:        {}\n", totals.domains_checked));
    out.push_str(&format!(
        "Domains with conflicts: {}\n",
        totals.domains_with_conflicts
    ));
    out.push_str(&format!(
        "Consistent domains:     {}\n",
        totals.consistent_domains
    ));
    out.push_str(&format!("Conflicts:              {}\n\n", conflicts.len()));

    if conflicts.is_empty() {
        out.push_str("No conflicts between robots.txt and ai.txt.\n");
        return out;
    }

    out.push_str(&format!(
        "{:30} {:25} {:30} {:28} {}\n",
        "Domain", "Agent", "Path", "Kind", "Effective"
    ));
    out.push_str(&"-".repeat(130));
    out.push('\n');

    for conflict in conflicts {
        let effective = match conflict.effective {
            Some(e) => format!(
                "robots={} ai={}",
                verdict(e.robots_allows),
                verdict(e.ai_allows)
            ),
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "{:30} {:25} {:30} {:28} {}\n",
            conflict.domain,
            conflict.agent,
            conflict.path,
            conflict.kind.as_str(),
            effective
        ));
        for evidence in &conflict.evidence {
            let location = format!("{}:{}", evidence.file, evidence.line);
            out.push_str(&format!("    {:16} {}\n", location, evidence.raw_text.trim()));
        }
    }

    out
}

/// Formats typo candidates
pub fn format_typo_report(typos: &[TypoCandidate]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:30} {:10} {:30} {:25} {}\n",
        "Domain", "File", "Unknown UA", "Suggestion", "Similarity"
    ));
    out.push_str(&"-".repeat(110));
    out.push('\n');

    for typo in typos {
        out.push_str(&format!(
            "{:30} {:10} {:30} {:25} {:.2}\n",
            typo.domain,
            typo.file.file_name(),
            typo.declared_agent,
            typo.suggested_known_agent,
            typo.similarity_score
        ));
    }
    out
}

/// Formats llms.txt links blocked by a permission file
pub fn format_cross_ref_report(refs: &[CrossRefConflict]) -> String {
    if refs.is_empty() {
        return "No llms.txt links pointing to blocked paths found.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:30} {:>5} {:50} {:10} {}\n",
        "Domain", "Line", "Link", "Blocked By", "Directive"
    ));
    out.push_str(&"-".repeat(120));
    out.push('\n');

    for conflict in refs {
        out.push_str(&format!(
            "{:30} {:>5} {:50} {:10} {}\n",
            conflict.domain,
            conflict.line,
            conflict.link,
            conflict.blocking_file.file_name(),
            conflict.blocking_directive.label()
        ));
    }
    out
}

/// Formats experimental directive occurrences
pub fn format_experimental_report(rows: &[ExperimentalDirective]) -> String {
    if rows.is_empty() {
        return "No DisallowAITraining or Content-Usage directives found.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:30} {:10} {:20} {:25} {}\n",
        "Domain", "File", "Directive", "Value", "Line"
    ));
    out.push_str(&"-".repeat(95));
    out.push('\n');

    for row in rows {
        out.push_str(&format!(
            "{:30} {:10} {:20} {:25} {}\n",
            row.domain,
            row.file.file_name(),
            row.directive.label(),
            row.value,
            row.line
        ));
    }
    out
}

/// Formats the per-agent table (R+/R- robots allow/disallow, A+/A- ai.txt, C conflicts)
///
/// The `*` row tallies wildcard groups, not a crawler.
pub fn format_agent_summary(tallies: &[AgentTally]) -> String {
    let mut out = String::new();
    out.push_str("UA `*` counts wildcard groups, not a named crawler.\n\n");
    out.push_str(&format!(
        "{:30} {:>6} {:>6} {:>6} {:>6} {:>6}\n",
        "UA", "R+", "R-", "A+", "A-", "C"
    ));
    out.push_str(&"-".repeat(66));
    out.push('\n');

    for tally in tallies {
        out.push_str(&format!(
            "{:30} {:>6} {:>6} {:>6} {:>6} {:>6}\n",
            tally.agent,
            tally.robots_allow_present,
            tally.robots_disallow_present,
            tally.ai_allow_present,
            tally.ai_disallow_present,
            tally.conflict_count
        ));
    }
    out
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
                    raw_text: "Allow: /private  ".to_string(),
                },
                Evidence {
                    file: SourceFile::Robots,
                    line: 7,
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
    fn test_conflict_report() {
        let totals = ConflictTotals {
            domains_checked: 3,
            domains_with_conflicts: 1,
            consistent_domains: 2,
        };
        let report = format_conflict_report(&[conflict()], totals);

        assert!(report.contains("Domains checked:        3"));
        assert!(report.contains("Consistent domains:     2"));
        assert!(report.contains("ai_allows_robots_disallows"));
        assert!(report.contains("robots=deny ai=allow"));
        assert!(report.contains("    ai.txt:2         Allow: /private\n"));
        assert!(report.contains("    robots.txt:7     Disallow: /private\n"));
    }

    #[test]
    fn test_empty_conflict_report() {
        let report = format_conflict_report(&[], ConflictTotals::default());
        assert!(report.contains("No conflicts"));
    }

    #[test]
    fn test_typo_report() {
        let report = format_typo_report(&[TypoCandidate {
            domain: "example.com".to_string(),
            file: SourceFile::Ai,
            declared_agent: "GPTB0T".to_string(),
            suggested_known_agent: "gptbot".to_string(),
            similarity_score: 5.0 / 6.0,
        }]);
        let row = report.lines().nth(2).unwrap();
        assert!(row.starts_with("example.com"));
        assert!(row.contains("GPTB0T"));
        assert!(row.contains("gptbot"));
        assert!(row.ends_with("0.83"));
    }

    #[test]
    fn test_cross_ref_report() {
        let report = format_cross_ref_report(&[CrossRefConflict {
            domain: "example.com".to_string(),
            line: 4,
            link: "https://example.com/private".to_string(),
            blocking_file: SourceFile::Ai,
            blocking_directive: DirectiveKind::ExperimentalTrainingOptOut,
        }]);
        assert!(report.contains("DisallowAITraining"));
        assert!(report.contains("ai.txt"));
        assert!(format_cross_ref_report(&[]).starts_with("No llms.txt links"));
    }

    #[test]
    fn test_experimental_report() {
        let report = format_experimental_report(&[ExperimentalDirective {
            domain: "example.com".to_string(),
            file: SourceFile::Robots,
            directive: DirectiveKind::ContentUsage,
            value: "train-ai=n".to_string(),
            line: 3,
        }]);
        assert!(report.contains("Content-Usage"));
        assert!(report.contains("train-ai=n"));
    }

    #[test]
    fn test_agent_summary_columns() {
        let report = format_agent_summary(&[AgentTally {
            agent: "GPTBot".to_string(),
            robots_allow_present: 1,
            robots_disallow_present: 12,
            ai_allow_present: 3,
            ai_disallow_present: 0,
            conflict_count: 2,
        }]);
        let row = report.lines().nth(4).unwrap();
        assert!(row.starts_with("GPTBot"));
        assert!(row.ends_with("     2"));
        assert!(row.contains("    12"));
    }

    #[test]
    fn test_agent_summary_labels_wildcard_row() {
        let report = format_agent_summary(&[AgentTally {
            agent: "*".to_string(),
            robots_allow_present: 0,
            robots_disallow_present: 4,
            ai_allow_present: 0,
            ai_disallow_present: 0,
            conflict_count: 1,
        }]);
        assert!(report.starts_with("UA `*` counts wildcard groups, not a named crawler.\n"));
        assert!(report.lines().nth(2).unwrap().starts_with("UA "));
        assert!(report.lines().nth(4).unwrap().starts_with("* "));
    }
}
