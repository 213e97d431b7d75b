//! Corpus-wide per-agent tallies

use crate::analysis::ConflictRecord;
use crate::permissions::DomainPermissions;
use std::collections::BTreeMap;

/// Corpus-level counters for one agent identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentTally {
    pub agent: String,
    /// Domains whose robots.txt gives the agent at least one Allow
    pub robots_allow_present: u64,
    pub robots_disallow_present: u64,
    pub ai_allow_present: u64,
    pub ai_disallow_present: u64,
    /// Conflict records naming the agent
    pub conflict_count: u64,
}

impl AgentTally {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            ..Self::default()
        }
    }

    fn is_zero(&self) -> bool {
        self.robots_allow_present == 0
            && self.robots_disallow_present == 0
            && self.ai_allow_present == 0
            && self.ai_disallow_present == 0
            && self.conflict_count == 0
    }
}

/// Folds domain permissions and conflicts into [`AgentTally`] rows
#[derive(Debug, Default)]
pub struct ConflictAggregator {
    tallies: BTreeMap<String, AgentTally>,
}

impl ConflictAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn tally(&mut self, agent: &str) -> &mut AgentTally {
        self.tallies
            .entry(agent.to_string())
            .or_insert_with(|| AgentTally::new(agent))
    }

    /// Counts explicit records only; wildcard fallback is not applied
    pub fn add_domain(&mut self, permissions: &DomainPermissions) {
        for (agent, record) in &permissions.robots {
            let tally = self.tally(agent);
            tally.robots_allow_present += u64::from(!record.allow.is_empty());
            tally.robots_disallow_present += u64::from(!record.disallow.is_empty());
        }
        for (agent, record) in &permissions.ai {
            let tally = self.tally(agent);
            tally.ai_allow_present += u64::from(!record.allow.is_empty());
            tally.ai_disallow_present += u64::from(!record.disallow.is_empty());
        }
        self.tallies.retain(|_, t| !t.is_zero());
    }

    pub fn add_conflicts(&mut self, conflicts: &[ConflictRecord]) {
        for conflict in conflicts {
            self.tally(&conflict.agent).conflict_count += 1;
        }
    }

    /// Sums another aggregator's counters into this one
    pub fn merge(&mut self, other: ConflictAggregator) {
        for (agent, theirs) in other.tallies {
            let ours = self.tally(&agent);
            ours.robots_allow_present += theirs.robots_allow_present;
            ours.robots_disallow_present += theirs.robots_disallow_present;
            ours.ai_allow_present += theirs.ai_allow_present;
            ours.ai_disallow_present += theirs.ai_disallow_present;
            ours.conflict_count += theirs.conflict_count;
        }
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Rows by descending conflict count, then agent name
    pub fn finish(self) -> Vec<AgentTally> {
        let mut rows: Vec<AgentTally> = self.tallies.into_values().collect();
        rows.sort_by(|a, b| {
            b.conflict_count
                .cmp(&a.conflict_count)
                .then_with(|| a.agent.cmp(&b.agent))
        });
        rows
    }
}
