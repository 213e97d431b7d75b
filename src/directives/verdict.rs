//! Effective-access verdicts using the standard exclusion matcher
//!
//! The auditor's own rule model keeps raw patterns and never resolves
//! precedence. For reports it is useful to also know what a compliant
//! crawler would actually do, which is what the longest-match matcher
//! from the `robotstxt` crate answers.

use robotstxt::DefaultMatcher;
use url::Url;

/// Checks whether `agent` may fetch `url` under the given file content
///
/// # Arguments
///
/// * `content` - Raw permission file text
/// * `agent` - The agent identity as declared
/// * `url` - Absolute URL of the resource
///
/// # Returns
///
/// * `true` - The file allows the fetch (or has no rules at all)
/// * `false` - The file blocks it
pub fn agent_may_fetch(content: &str, agent: &str, url: &Url) -> bool {
    if content.trim().is_empty() {
        return true;
    }

    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(content, agent, url.as_str())
}
