//! llms.txt link checks against the combined block-list

use crate::directives::{anchor_pattern, tokenize, DirectiveKind};
use crate::snapshot::{DomainSources, SourceFile};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;

/// Markdown-style link whose target is absolute http(s) or root-relative
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[.*?\]\((https?://[^)]+|/[^)]*)\)").expect("valid link regex"));

/// One blocking pattern and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    pub pattern: String,
    pub file: SourceFile,
    pub directive: DirectiveKind,
}

impl BlockRule {
    /// `/` blocks everything; any other pattern blocks by prefix
    pub fn blocks(&self, path: &str) -> bool {
        self.pattern == "/" || path.starts_with(self.pattern.as_str())
    }
}

/// An advertised link that a permission file blocks
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrossRefConflict {
    pub domain: String,
    pub line: usize,
    pub link: String,
    pub blocking_file: SourceFile,
    pub blocking_directive: DirectiveKind,
}

/// Collects blocking patterns from one permission file
///
/// `Disallow` values are taken as-is, `DisallowAITraining` only when it
/// opts out of everything (`/`), and `Content-Usage` values are treated as
/// path patterns. Group membership is irrelevant here.
pub fn collect_block_rules(text: &str, file: SourceFile, domain: &str) -> Vec<BlockRule> {
    let source = file.canonical_url(domain).ok();

    tokenize(text)
        .into_iter()
        .filter(|d| match d.kind {
            DirectiveKind::Disallow | DirectiveKind::ContentUsage => !d.value.is_empty(),
            DirectiveKind::ExperimentalTrainingOptOut => d.value == "/",
            _ => false,
        })
        .map(|d| {
            let pattern = match &source {
                Some(url) => anchor_pattern(d.value, url),
                None => Cow::Borrowed(d.value),
            };
            BlockRule {
                pattern: pattern.into_owned(),
                file,
                directive: d.kind,
            }
        })
        .collect()
}

/// Reduces a link to a path on `domain`
///
/// # Example
///
/// ```
/// use sumi_audit::analysis::normalize_link;
///
/// assert_eq!(normalize_link("example.com", "https://example.com/blog/post"), "/blog/post");
/// assert_eq!(normalize_link("example.com", "/about"), "/about");
/// assert_eq!(normalize_link("example.com", "https://example.com"), "/");
/// ```
pub fn normalize_link(domain: &str, link: &str) -> String {
    if link.starts_with('/') {
        return link.to_string();
    }

    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    let rest = rest.strip_prefix(domain).unwrap_or(rest);

    match rest.split_once('/') {
        Some((_, path)) => format!("/{}", path),
        None => "/".to_string(),
    }
}

/// Extracts `(line, link)` pairs from llms.txt content
pub fn extract_links(text: &str) -> Vec<(usize, &str)> {
    let mut links = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for caps in LINK_RE.captures_iter(line) {
            if let Some(target) = caps.get(1) {
                links.push((idx + 1, target.as_str()));
            }
        }
    }
    links
}

/// Checks a domain's llms.txt links against both permission files
///
/// Output is in llms.txt line order, exact duplicates removed.
pub fn check_cross_references(sources: &DomainSources) -> Vec<CrossRefConflict> {
    let Some(llms) = sources.get(SourceFile::Llms) else {
        return Vec::new();
    };

    let rules: Vec<BlockRule> = SourceFile::PERMISSION_FILES
        .iter()
        .filter_map(|file| {
            sources
                .get(*file)
                .map(|text| collect_block_rules(text, *file, &sources.domain))
        })
        .flatten()
        .collect();
    if rules.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut conflicts = Vec::new();
    for (line, link) in extract_links(llms) {
        let path = normalize_link(&sources.domain, link);
        for rule in rules.iter().filter(|r| r.blocks(&path)) {
            let conflict = CrossRefConflict {
                domain: sources.domain.clone(),
                line,
                link: link.to_string(),
                blocking_file: rule.file,
                blocking_directive: rule.directive,
            };
            if seen.insert(conflict.clone()) {
                conflicts.push(conflict);
            }
        }
    }
    conflicts
}
