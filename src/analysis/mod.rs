//! Read-only analyses over parsed permission files
//!
//! Every analysis here is a pure function of one domain's records (and, for
//! evidence and links, its source text). Corpus-level rollups live in
//! [`ConflictAggregator`].

mod aggregate;
mod conflicts;
mod crossref;
mod diff;
mod experimental;
mod typos;

pub use aggregate::{AgentTally, ConflictAggregator};
pub use conflicts::{
    find_directive_lines, ConflictDetector, ConflictKind, ConflictRecord, EffectiveAccess,
    Evidence,
};
pub use crossref::{
    check_cross_references, collect_block_rules, extract_links, normalize_link, BlockRule,
    CrossRefConflict,
};
pub use diff::{diff_domain, diff_records, diff_rule_sets, DiffDocument, DomainDiff, RuleDiff};
pub use experimental::{scan_experimental, ExperimentalDirective};
pub use typos::{similarity, TypoCandidate, TypoDetector, DEFAULT_TYPO_THRESHOLD};
