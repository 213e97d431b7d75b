//! Near-miss crawler identity detection

use crate::permissions::{AgentVocabulary, DomainPermissions, WILDCARD};
use crate::snapshot::SourceFile;

/// Minimum similarity for a suggestion to be reported
pub const DEFAULT_TYPO_THRESHOLD: f64 = 0.6;

/// A declared agent that looks like a misspelled AI crawler
#[derive(Debug, Clone, PartialEq)]
pub struct TypoCandidate {
    pub domain: String,
    pub file: SourceFile,
    pub declared_agent: String,
    pub suggested_known_agent: String,
    pub similarity_score: f64,
}

/// Levenshtein distance over chars
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity in `0.0..=1.0` over lowercased strings
///
/// Symmetric, 1.0 for identical input, and decreasing as the edit distance
/// grows.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

/// Suggests known crawler names for misspelled declarations
pub struct TypoDetector<'v> {
    vocabulary: &'v AgentVocabulary,
    threshold: f64,
}

impl<'v> TypoDetector<'v> {
    pub fn new(vocabulary: &'v AgentVocabulary) -> Self {
        Self::with_threshold(vocabulary, DEFAULT_TYPO_THRESHOLD)
    }

    pub fn with_threshold(vocabulary: &'v AgentVocabulary, threshold: f64) -> Self {
        Self {
            vocabulary,
            threshold,
        }
    }

    /// Best vocabulary entry at or above the threshold
    ///
    /// Ties go to the entry listed first.
    pub fn closest_match(&self, agent: &str) -> Option<(&'v str, f64)> {
        let mut best: Option<(&'v str, f64)> = None;
        for known in self.vocabulary.agents() {
            let score = similarity(agent, known);
            if score < self.threshold {
                continue;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((known.as_str(), score));
            }
        }
        best
    }

    /// Emits one candidate per (declared agent, declaring file)
    ///
    /// Candidates come out sorted by agent, robots.txt before ai.txt.
    pub fn detect(&self, domain: &str, permissions: &DomainPermissions) -> Vec<TypoCandidate> {
        let mut candidates = Vec::new();

        for agent in permissions.declared_agents() {
            if agent == WILDCARD || self.vocabulary.is_known(agent) {
                continue;
            }
            let Some((suggestion, score)) = self.closest_match(agent) else {
                continue;
            };

            for file in SourceFile::PERMISSION_FILES {
                if permissions.declares(file, agent) {
                    candidates.push(TypoCandidate {
                        domain: domain.to_string(),
                        file,
                        declared_agent: agent.to_string(),
                        suggested_known_agent: suggestion.to_string(),
                        similarity_score: score,
                    });
                }
            }
        }

        candidates
    }
}
