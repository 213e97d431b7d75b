//! AI-crawler conflict detection with line-level evidence
//!
//! A conflict is a path that one file allows and the other disallows for the
//! same agent (after wildcard resolution). Only the wildcard and agents
//! matching the AI-crawler vocabulary are audited.

use crate::directives::{agent_may_fetch, anchor_pattern, tokenize, DirectiveKind};
use crate::permissions::{AgentVocabulary, DomainPermissions, WILDCARD};
use crate::snapshot::{DomainSources, SourceFile};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// Direction of a contradiction between the two files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictKind {
    /// ai.txt allows a path that robots.txt disallows
    AiAllowsRobotsDisallows,
    /// ai.txt disallows a path that robots.txt allows
    AiDisallowsRobotsAllows,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiAllowsRobotsDisallows => "ai_allows_robots_disallows",
            Self::AiDisallowsRobotsAllows => "ai_disallows_robots_allows",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ai_allows_robots_disallows" => Some(Self::AiAllowsRobotsDisallows),
            "ai_disallows_robots_allows" => Some(Self::AiDisallowsRobotsAllows),
            _ => None,
        }
    }

    /// The directive on the ai.txt side
    fn ai_directive(&self) -> DirectiveKind {
        match self {
            Self::AiAllowsRobotsDisallows => DirectiveKind::Allow,
            Self::AiDisallowsRobotsAllows => DirectiveKind::Disallow,
        }
    }

    /// The directive on the robots.txt side
    fn robots_directive(&self) -> DirectiveKind {
        match self {
            Self::AiAllowsRobotsDisallows => DirectiveKind::Disallow,
            Self::AiDisallowsRobotsAllows => DirectiveKind::Allow,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source line backing a conflict
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evidence {
    pub file: SourceFile,
    pub line: usize,
    pub raw_text: String,
}

/// What a longest-match crawler would do with the conflicting path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectiveAccess {
    pub robots_allows: bool,
    pub ai_allows: bool,
}

/// A contradiction between robots.txt and ai.txt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConflictRecord {
    pub domain: String,
    pub agent: String,
    pub path: String,
    pub kind: ConflictKind,
    pub evidence: Vec<Evidence>,
    /// `None` when the path cannot be turned into a URL on the domain
    pub effective: Option<EffectiveAccess>,
}

/// Finds every line in `text` declaring `kind: path`
///
/// Values are compared after the same anchoring the rule builder applies,
/// so an absolute same-origin pattern still matches its path.
pub fn find_directive_lines<'t>(
    text: &'t str,
    kind: DirectiveKind,
    path: &str,
    source: Option<&Url>,
) -> Vec<(usize, &'t str)> {
    tokenize(text)
        .into_iter()
        .filter(|d| d.kind == kind)
        .filter(|d| match source {
            Some(url) => anchor_pattern(d.value, url) == path,
            None => d.value == path,
        })
        .map(|d| (d.line, d.raw))
        .collect()
}

/// Detects conflicts for the audited agents of one domain
pub struct ConflictDetector<'v> {
    vocabulary: &'v AgentVocabulary,
}

impl<'v> ConflictDetector<'v> {
    pub fn new(vocabulary: &'v AgentVocabulary) -> Self {
        Self { vocabulary }
    }

    /// The wildcard and every vocabulary match are audited
    pub fn is_audited(&self, agent: &str) -> bool {
        agent == WILDCARD || self.vocabulary.is_known(agent)
    }

    /// Produces the conflicts of one domain
    ///
    /// # Arguments
    ///
    /// * `permissions` - The domain's parsed records
    /// * `sources` - The original file texts, re-scanned for evidence
    ///
    /// # Returns
    ///
    /// Conflicts ordered by agent, kind, then path
    pub fn detect(
        &self,
        permissions: &DomainPermissions,
        sources: &DomainSources,
    ) -> Vec<ConflictRecord> {
        let mut agents = permissions.declared_agents();
        agents.insert(WILDCARD);

        let mut conflicts = Vec::new();
        for agent in agents.into_iter().filter(|a| self.is_audited(a)) {
            let robots = permissions.robots_for(agent);
            let ai = permissions.ai_for(agent);

            let robots_allow: BTreeSet<&str> = robots.allow.iter().map(String::as_str).collect();
            let robots_disallow: BTreeSet<&str> =
                robots.disallow.iter().map(String::as_str).collect();
            let ai_allow: BTreeSet<&str> = ai.allow.iter().map(String::as_str).collect();
            let ai_disallow: BTreeSet<&str> = ai.disallow.iter().map(String::as_str).collect();

            for path in ai_allow.intersection(&robots_disallow) {
                conflicts.push(self.record(
                    sources,
                    agent,
                    path,
                    ConflictKind::AiAllowsRobotsDisallows,
                ));
            }
            for path in ai_disallow.intersection(&robots_allow) {
                conflicts.push(self.record(
                    sources,
                    agent,
                    path,
                    ConflictKind::AiDisallowsRobotsAllows,
                ));
            }
        }

        conflicts
    }

    fn record(
        &self,
        sources: &DomainSources,
        agent: &str,
        path: &str,
        kind: ConflictKind,
    ) -> ConflictRecord {
        ConflictRecord {
            domain: sources.domain.clone(),
            agent: agent.to_string(),
            path: path.to_string(),
            kind,
            evidence: collect_evidence(sources, path, kind),
            effective: effective_access(sources, agent, path),
        }
    }
}

/// ai.txt lines first, then robots.txt lines, each in file order
fn collect_evidence(sources: &DomainSources, path: &str, kind: ConflictKind) -> Vec<Evidence> {
    let sides = [
        (SourceFile::Ai, kind.ai_directive()),
        (SourceFile::Robots, kind.robots_directive()),
    ];

    let mut evidence = Vec::new();
    for (file, directive) in sides {
        let Some(text) = sources.get(file) else {
            continue;
        };
        let source = file.canonical_url(&sources.domain).ok();
        for (line, raw) in find_directive_lines(text, directive, path, source.as_ref()) {
            evidence.push(Evidence {
                file,
                line,
                raw_text: raw.to_string(),
            });
        }
    }
    evidence
}

fn effective_access(sources: &DomainSources, agent: &str, path: &str) -> Option<EffectiveAccess> {
    let base = Url::parse(&format!("https://{}/", sources.domain)).ok()?;
    let target = base.join(path).ok()?;

    Some(EffectiveAccess {
        robots_allows: agent_may_fetch(
            sources.get(SourceFile::Robots).unwrap_or_default(),
            agent,
            &target,
        ),
        ai_allows: agent_may_fetch(sources.get(SourceFile::Ai).unwrap_or_default(), agent, &target),
    })
}
