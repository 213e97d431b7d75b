//! Permission file parsing
//!
//! This module turns `robots.txt`-style text into structured data:
//! - `lexer`: one tokenizing pass producing tagged directives with line numbers
//! - `rules`: exclusion-protocol grouping into per-agent allow/disallow records
//! - `verdict`: effective access as decided by the standard matcher

mod lexer;
mod rules;
mod verdict;

pub use lexer::{decode, parse_line, tokenize, Directive, DirectiveKind};
pub use rules::{
    anchor_pattern, build_rules, build_rules_with_declared, AgentRules, PermissionRecord,
    RuleSetBuilder,
};
pub use verdict::agent_may_fetch;
