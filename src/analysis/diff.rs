//! Structural diff of two rule files
//!
//! Unlike conflict detection this is unfiltered: every agent declared in
//! either file (plus the wildcard) gets the six set-algebra buckets.

use crate::directives::{AgentRules, PermissionRecord};
use crate::permissions::{resolve, DomainPermissions, WILDCARD};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Set differences between the robots.txt and ai.txt records of one agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDiff {
    pub allow_equal: Vec<String>,
    pub allow_only_robots: Vec<String>,
    pub allow_only_ai: Vec<String>,
    pub disallow_equal: Vec<String>,
    pub disallow_only_robots: Vec<String>,
    pub disallow_only_ai: Vec<String>,
}

impl RuleDiff {
    /// Returns true when both records hold exactly the same patterns
    pub fn is_identical(&self) -> bool {
        self.allow_only_robots.is_empty()
            && self.allow_only_ai.is_empty()
            && self.disallow_only_robots.is_empty()
            && self.disallow_only_ai.is_empty()
    }
}

/// Agent identity to its diff, for one domain
pub type DomainDiff = BTreeMap<String, RuleDiff>;

fn as_set(patterns: &[String]) -> BTreeSet<&str> {
    patterns.iter().map(String::as_str).collect()
}

fn owned<'a>(patterns: impl Iterator<Item = &'a str>) -> Vec<String> {
    patterns.map(str::to_string).collect()
}

/// Diffs two records; `left` takes the robots.txt position
pub fn diff_records(left: &PermissionRecord, right: &PermissionRecord) -> RuleDiff {
    let left_allow = as_set(&left.allow);
    let right_allow = as_set(&right.allow);
    let left_disallow = as_set(&left.disallow);
    let right_disallow = as_set(&right.disallow);

    RuleDiff {
        allow_equal: owned(left_allow.intersection(&right_allow).copied()),
        allow_only_robots: owned(left_allow.difference(&right_allow).copied()),
        allow_only_ai: owned(right_allow.difference(&left_allow).copied()),
        disallow_equal: owned(left_disallow.intersection(&right_disallow).copied()),
        disallow_only_robots: owned(left_disallow.difference(&right_disallow).copied()),
        disallow_only_ai: owned(right_disallow.difference(&left_disallow).copied()),
    }
}

/// Diffs two arbitrary rule files agent by agent
///
/// Agents missing on one side are resolved through that side's wildcard.
pub fn diff_rule_sets(left: &AgentRules, right: &AgentRules) -> DomainDiff {
    let mut agents: BTreeSet<&str> = left.keys().chain(right.keys()).map(String::as_str).collect();
    agents.insert(WILDCARD);

    agents
        .into_iter()
        .map(|agent| {
            let diff = diff_records(resolve(left, agent), resolve(right, agent));
            (agent.to_string(), diff)
        })
        .collect()
}

/// Diffs a domain's robots.txt against its ai.txt
pub fn diff_domain(permissions: &DomainPermissions) -> DomainDiff {
    diff_rule_sets(&permissions.robots, &permissions.ai)
}

/// Domain to per-agent diffs, sorted by domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffDocument {
    domains: BTreeMap<String, DomainDiff>,
}

impl DiffDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: impl Into<String>, diff: DomainDiff) {
        self.domains.insert(domain.into(), diff);
    }

    pub fn get(&self, domain: &str) -> Option<&DomainDiff> {
        self.domains.get(domain)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn extend(&mut self, other: DiffDocument) {
        self.domains.extend(other.domains);
    }
}
