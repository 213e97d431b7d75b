//! Stage partials and the merged audit result

use crate::analysis::{
    AgentTally, ConflictAggregator, ConflictRecord, CrossRefConflict, DiffDocument,
    ExperimentalDirective, TypoCandidate,
};
use crate::permissions::PermissionMap;
use crate::pipeline::pool::Partial;
use std::collections::BTreeSet;

/// Everything the permission stage produces for a set of domains
#[derive(Debug, Default)]
pub struct PermissionPartial {
    pub map: PermissionMap,
    pub diffs: DiffDocument,
    pub conflicts: Vec<ConflictRecord>,
    pub typos: Vec<TypoCandidate>,
    pub agents: ConflictAggregator,
}

impl Partial for PermissionPartial {
    fn merge(&mut self, other: Self) {
        self.map.extend(other.map);
        self.diffs.extend(other.diffs);
        self.conflicts.extend(other.conflicts);
        self.typos.extend(other.typos);
        self.agents.merge(other.agents);
    }
}

/// Per-stage domain counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStats {
    pub stage: String,
    pub selected: usize,
    pub processed: usize,
    pub failed: usize,
}

/// The merged, ordered outcome of a run
#[derive(Debug, Default)]
pub struct AuditResults {
    pub permissions: PermissionMap,
    pub diffs: DiffDocument,
    pub conflicts: Vec<ConflictRecord>,
    pub typos: Vec<TypoCandidate>,
    pub cross_refs: Vec<CrossRefConflict>,
    pub experimental: Vec<ExperimentalDirective>,
    pub agents: Vec<AgentTally>,
    pub stages: Vec<StageStats>,
}

impl AuditResults {
    /// Sorts every listing so output does not depend on worker scheduling
    pub fn normalize(&mut self) {
        self.conflicts.sort_by(|a, b| {
            (&a.domain, &a.agent, a.kind, &a.path).cmp(&(&b.domain, &b.agent, b.kind, &b.path))
        });
        self.typos.sort_by(|a, b| {
            (&a.domain, &a.declared_agent, a.file).cmp(&(&b.domain, &b.declared_agent, b.file))
        });
        self.cross_refs.sort();
        self.cross_refs.dedup();
        self.experimental.sort();
    }

    /// Domains the conflict detector looked at
    pub fn domains_checked(&self) -> usize {
        self.permissions.len()
    }

    /// Domains with at least one conflict
    pub fn domains_with_conflicts(&self) -> usize {
        self.conflicts
            .iter()
            .map(|c| c.domain.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn consistent_domains(&self) -> usize {
        self.domains_checked()
            .saturating_sub(self.domains_with_conflicts())
    }

    pub fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ConflictKind;
    use crate::directives::DirectiveKind;
    use crate::permissions::DomainPermissions;
    use crate::snapshot::SourceFile;

    fn conflict(domain: &str, agent: &str, path: &str) -> ConflictRecord {
        ConflictRecord {
            domain: domain.to_string(),
            agent: agent.to_string(),
            path: path.to_string(),
            kind: ConflictKind::AiAllowsRobotsDisallows,
            evidence: Vec::new(),
            effective: None,
        }
    }

    #[test]
    fn test_normalize_orders_listings() {
        let mut results = AuditResults {
            conflicts: vec![
                conflict("b.com", "GPTBot", "/"),
                conflict("a.com", "GPTBot", "/z"),
                conflict("a.com", "GPTBot", "/a"),
                conflict("a.com", "*", "/z"),
            ],
            cross_refs: vec![
                CrossRefConflict {
                    domain: "b.com".to_string(),
                    line: 1,
                    link: "/x".to_string(),
                    blocking_file: SourceFile::Ai,
                    blocking_directive: DirectiveKind::Disallow,
                },
                CrossRefConflict {
                    domain: "a.com".to_string(),
                    line: 9,
                    link: "/x".to_string(),
                    blocking_file: SourceFile::Robots,
                    blocking_directive: DirectiveKind::Disallow,
                },
            ],
            ..AuditResults::default()
        };
        results.normalize();

        let order: Vec<(&str, &str, &str)> = results
            .conflicts
            .iter()
            .map(|c| (c.domain.as_str(), c.agent.as_str(), c.path.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.com", "*", "/z"),
                ("a.com", "GPTBot", "/a"),
                ("a.com", "GPTBot", "/z"),
                ("b.com", "GPTBot", "/"),
            ]
        );
        assert_eq!(results.cross_refs[0].domain, "a.com");
    }

    #[test]
    fn test_domain_counts() {
        let mut results = AuditResults::default();
        results.permissions.insert("a.com", DomainPermissions::default());
        results.permissions.insert("b.com", DomainPermissions::default());
        results.permissions.insert("c.com", DomainPermissions::default());
        results.conflicts = vec![
            conflict("a.com", "GPTBot", "/x"),
            conflict("a.com", "GPTBot", "/y"),
        ];

        assert_eq!(results.domains_checked(), 3);
        assert_eq!(results.domains_with_conflicts(), 1);
        assert_eq!(results.consistent_domains(), 2);
    }

    #[test]
    fn test_permission_partial_merge() {
        let mut left = PermissionPartial::default();
        left.map.insert("a.com", DomainPermissions::default());
        left.conflicts.push(conflict("a.com", "*", "/"));

        let mut right = PermissionPartial::default();
        right.map.insert("b.com", DomainPermissions::default());
        right.conflicts.push(conflict("b.com", "*", "/"));

        left.merge(right);
        assert_eq!(left.map.len(), 2);
        assert_eq!(left.conflicts.len(), 2);
    }
}
