//! Line-level tokenizer for permission files
//!
//! Turns raw file text into an ordered list of recognized directives. Lines
//! that are blank, comments, or use an unknown field name produce nothing.

/// The directive vocabulary understood by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectiveKind {
    /// `User-Agent:` (or the short form `Agent:`)
    Agent,
    /// `Allow:`
    Allow,
    /// `Disallow:`
    Disallow,
    /// `DisallowAITraining:`
    ExperimentalTrainingOptOut,
    /// `Content-Usage:`
    ContentUsage,
}

impl DirectiveKind {
    /// Recognizes a field name, ignoring case and surrounding whitespace
    pub fn from_field(field: &str) -> Option<Self> {
        match field.trim().to_ascii_lowercase().as_str() {
            "user-agent" | "agent" => Some(Self::Agent),
            "allow" => Some(Self::Allow),
            "disallow" => Some(Self::Disallow),
            "disallowaitraining" => Some(Self::ExperimentalTrainingOptOut),
            "content-usage" => Some(Self::ContentUsage),
            _ => None,
        }
    }

    /// Canonical spelling used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Agent => "User-Agent",
            Self::Allow => "Allow",
            Self::Disallow => "Disallow",
            Self::ExperimentalTrainingOptOut => "DisallowAITraining",
            Self::ContentUsage => "Content-Usage",
        }
    }

    /// Returns true for everything that attaches to an agent group
    pub fn is_rule(&self) -> bool {
        !matches!(self, Self::Agent)
    }

    /// Returns true for the non-standard AI vocabulary
    pub fn is_experimental(&self) -> bool {
        matches!(self, Self::ExperimentalTrainingOptOut | Self::ContentUsage)
    }

    /// Whether a directive of this kind may carry an empty value
    ///
    /// An empty `Disallow:` is meaningful (it allows everything) and still
    /// closes the preceding run of agent lines.
    fn accepts_empty_value(&self) -> bool {
        matches!(self, Self::Allow | Self::Disallow)
    }
}

/// A recognized directive, borrowing from the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    pub kind: DirectiveKind,
    /// Value with surrounding whitespace and trailing comment removed
    pub value: &'a str,
    /// 1-based physical line number
    pub line: usize,
    /// The untouched source line
    pub raw: &'a str,
}

/// Decodes file bytes permissively
///
/// Invalid UTF-8 sequences become U+FFFD and a leading byte-order mark is
/// dropped, so a single badly encoded file never aborts a run.
pub fn decode(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    }
}

/// Parses one physical line
///
/// # Arguments
///
/// * `raw` - The line as it appears in the file
/// * `line` - Its 1-based line number
///
/// # Returns
///
/// * `Some(Directive)` - The line matches the directive grammar
/// * `None` - Blank, comment, unknown field, or missing value
pub fn parse_line(raw: &str, line: usize) -> Option<Directive<'_>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (field, rest) = trimmed.split_once(':')?;
    let kind = DirectiveKind::from_field(field)?;

    let value = match rest.find('#') {
        Some(idx) => &rest[..idx],
        None => rest,
    }
    .trim();

    if value.is_empty() && !kind.accepts_empty_value() {
        return None;
    }

    Some(Directive {
        kind,
        value,
        line,
        raw,
    })
}

/// Tokenizes a whole file in a single pass
///
/// # Example
///
/// ```
/// use sumi_audit::directives::{tokenize, DirectiveKind};
///
/// let directives = tokenize("User-agent: *\n# comment\nDisallow: /private\n");
/// assert_eq!(directives.len(), 2);
/// assert_eq!(directives[1].kind, DirectiveKind::Disallow);
/// assert_eq!(directives[1].line, 3);
/// ```
pub fn tokenize(text: &str) -> Vec<Directive<'_>> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| parse_line(raw, idx + 1))
        .collect()
}
