//! Group-scoped rule accumulation
//!
//! Consecutive agent lines form a run; every rule line that follows applies
//! to all agents in that run. An agent line seen after at least one rule
//! starts a fresh run.

use crate::directives::lexer::{tokenize, Directive, DirectiveKind};
use crate::permissions::WILDCARD;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Allow/disallow patterns declared for one agent in one file
///
/// Both lists behave as ordered sets: first occurrence wins, repeats are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
}

impl PermissionRecord {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_allow(&mut self, pattern: &str) {
        insert_unique(&mut self.allow, pattern);
    }

    pub fn add_disallow(&mut self, pattern: &str) {
        insert_unique(&mut self.disallow, pattern);
    }

    /// Returns true if neither list holds a pattern
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.disallow.is_empty()
    }
}

fn insert_unique(list: &mut Vec<String>, pattern: &str) {
    if !list.iter().any(|p| p == pattern) {
        list.push(pattern.to_string());
    }
}

/// Agent identity (original casing) to its record for one file
pub type AgentRules = BTreeMap<String, PermissionRecord>;

/// Reduces a same-origin absolute pattern to its path
///
/// `Disallow: https://example.com/private` in the file served from
/// `https://example.com/robots.txt` means `/private`. Anything else is
/// returned unchanged.
pub fn anchor_pattern<'a>(value: &'a str, source: &Url) -> Cow<'a, str> {
    let lower = value.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Cow::Borrowed(value);
    }

    match Url::parse(value) {
        Ok(parsed) if parsed.host_str() == source.host_str() => {
            let mut path = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            Cow::Owned(path)
        }
        _ => Cow::Borrowed(value),
    }
}

/// Accumulates directives into per-agent records
///
/// An agent gets a record only once an `Allow`/`Disallow` line attaches to
/// it. Agents named without such a line are kept in the declared set, so
/// lookups for them still fall back to `*`.
pub struct RuleSetBuilder<'u> {
    source: &'u Url,
    rules: AgentRules,
    declared: BTreeSet<String>,
    active: Vec<String>,
    group_has_rules: bool,
}

impl<'u> RuleSetBuilder<'u> {
    /// Creates a builder anchored at the declaring file's URL
    pub fn new(source: &'u Url) -> Self {
        Self {
            source,
            rules: AgentRules::new(),
            declared: BTreeSet::new(),
            active: Vec::new(),
            group_has_rules: false,
        }
    }

    /// Feeds the next directive in file order
    pub fn push(&mut self, directive: &Directive<'_>) {
        if directive.kind == DirectiveKind::Agent {
            if self.group_has_rules {
                self.active.clear();
                self.group_has_rules = false;
            }
            self.activate(directive.value);
            return;
        }

        self.group_has_rules = true;
        if self.active.is_empty() {
            // Rules with no preceding agent line apply to everyone
            self.activate(WILDCARD);
        }

        if !matches!(directive.kind, DirectiveKind::Allow | DirectiveKind::Disallow) {
            return;
        }

        // An empty value still attaches, it just adds no pattern
        let pattern =
            (!directive.value.is_empty()).then(|| anchor_pattern(directive.value, self.source));
        for agent in &self.active {
            let record = self.rules.entry(agent.clone()).or_default();
            match (directive.kind, &pattern) {
                (DirectiveKind::Allow, Some(p)) => record.add_allow(p),
                (DirectiveKind::Disallow, Some(p)) => record.add_disallow(p),
                _ => {}
            }
        }
    }

    fn activate(&mut self, agent: &str) {
        self.declared.insert(agent.to_string());
        if !self.active.iter().any(|a| a == agent) {
            self.active.push(agent.to_string());
        }
    }

    /// Returns the records plus every agent named on an agent line
    pub fn finish_with_declared(self) -> (AgentRules, BTreeSet<String>) {
        (self.rules, self.declared)
    }
}

/// Parses a whole file into per-agent records
///
/// # Arguments
///
/// * `text` - Decoded file content
/// * `source` - Canonical URL of the file, used to anchor absolute patterns
///
/// # Example
///
/// ```
/// use sumi_audit::directives::build_rules;
/// use url::Url;
///
/// let source = Url::parse("https://example.com/robots.txt").unwrap();
/// let rules = build_rules("User-agent: A\nUser-agent: B\nDisallow: /x\n", &source);
/// assert_eq!(rules["A"].disallow, vec!["/x"]);
/// assert_eq!(rules["B"].disallow, vec!["/x"]);
/// ```
pub fn build_rules(text: &str, source: &Url) -> AgentRules {
    build_rules_with_declared(text, source).0
}

/// Like [`build_rules`], also returning the agents the file names
pub fn build_rules_with_declared(text: &str, source: &Url) -> (AgentRules, BTreeSet<String>) {
    let mut builder = RuleSetBuilder::new(source);
    for directive in tokenize(text) {
        builder.push(&directive);
    }
    builder.finish_with_declared()
}
