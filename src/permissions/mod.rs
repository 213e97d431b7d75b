//! The corpus-wide permission map
//!
//! For every domain the map holds the per-agent records parsed from
//! `robots.txt` and `ai.txt`. It is built once per snapshot and only read
//! afterwards; wildcard fallback happens at lookup time and is never
//! written back into the map.

mod vocabulary;

pub use vocabulary::{AgentVocabulary, DEFAULT_AI_AGENTS};

use crate::directives::{build_rules_with_declared, AgentRules, PermissionRecord};
use crate::snapshot::{DomainSources, SourceFile};
use crate::AuditError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// The wildcard agent identity
pub const WILDCARD: &str = "*";

static EMPTY_RECORD: PermissionRecord = PermissionRecord {
    allow: Vec::new(),
    disallow: Vec::new(),
};

/// Looks up an agent, falling back to `*` and then to an empty record
pub fn resolve<'a>(rules: &'a AgentRules, agent: &str) -> &'a PermissionRecord {
    rules
        .get(agent)
        .or_else(|| rules.get(WILDCARD))
        .unwrap_or(&EMPTY_RECORD)
}

/// Both files' records for one domain
///
/// Agents named on an agent line with no rule attached have no record, so
/// they resolve through `*`. They are still remembered per file for
/// identity checks, but that set is not part of the serialized map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainPermissions {
    #[serde(default)]
    pub robots: AgentRules,
    #[serde(default)]
    pub ai: AgentRules,
    #[serde(skip)]
    robots_declared: BTreeSet<String>,
    #[serde(skip)]
    ai_declared: BTreeSet<String>,
}

impl PartialEq for DomainPermissions {
    fn eq(&self, other: &Self) -> bool {
        self.robots == other.robots && self.ai == other.ai
    }
}

impl Eq for DomainPermissions {}

impl DomainPermissions {
    /// Parses whichever permission files are present
    ///
    /// A missing file contributes no rules.
    pub fn from_sources(sources: &DomainSources) -> Result<Self, AuditError> {
        let mut permissions = Self::default();
        for file in SourceFile::PERMISSION_FILES {
            let Some(text) = sources.get(file) else {
                continue;
            };
            let source = file
                .canonical_url(&sources.domain)
                .map_err(|e| AuditError::Domain {
                    domain: sources.domain.clone(),
                    message: format!("invalid domain name: {}", e),
                })?;
            let (rules, declared) = build_rules_with_declared(text, &source);
            match file {
                SourceFile::Robots => {
                    permissions.robots = rules;
                    permissions.robots_declared = declared;
                }
                _ => {
                    permissions.ai = rules;
                    permissions.ai_declared = declared;
                }
            }
        }
        Ok(permissions)
    }

    /// Resolved robots.txt record for an agent
    pub fn robots_for(&self, agent: &str) -> &PermissionRecord {
        resolve(&self.robots, agent)
    }

    /// Resolved ai.txt record for an agent
    pub fn ai_for(&self, agent: &str) -> &PermissionRecord {
        resolve(&self.ai, agent)
    }

    /// Whether a permission file names the agent, with or without rules
    pub fn declares(&self, file: SourceFile, agent: &str) -> bool {
        let (rules, declared) = match file {
            SourceFile::Robots => (&self.robots, &self.robots_declared),
            SourceFile::Ai => (&self.ai, &self.ai_declared),
            SourceFile::Llms => return false,
        };
        rules.contains_key(agent) || declared.contains(agent)
    }

    /// Every agent identity declared in either file, sorted
    pub fn declared_agents(&self) -> BTreeSet<&str> {
        self.robots
            .keys()
            .chain(self.ai.keys())
            .chain(&self.robots_declared)
            .chain(&self.ai_declared)
            .map(String::as_str)
            .collect()
    }
}

/// Domain to permissions, sorted by domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap {
    domains: BTreeMap<String, DomainPermissions>,
}

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: impl Into<String>, permissions: DomainPermissions) {
        self.domains.insert(domain.into(), permissions);
    }

    pub fn get(&self, domain: &str) -> Option<&DomainPermissions> {
        self.domains.get(domain)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DomainPermissions)> {
        self.domains.iter().map(|(d, p)| (d.as_str(), p))
    }

    /// Folds another partition into this one
    pub fn extend(&mut self, other: PermissionMap) {
        self.domains.extend(other.domains);
    }

    /// Loads a previously written map
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
