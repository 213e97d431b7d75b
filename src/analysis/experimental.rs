//! Non-standard AI directive scanning

use crate::directives::{tokenize, DirectiveKind};
use crate::snapshot::{DomainSources, SourceFile};

/// A `DisallowAITraining` or `Content-Usage` line found in a permission file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExperimentalDirective {
    pub domain: String,
    pub file: SourceFile,
    pub directive: DirectiveKind,
    pub value: String,
    pub line: usize,
}

/// Lists experimental directives in robots.txt then ai.txt, in file order
pub fn scan_experimental(sources: &DomainSources) -> Vec<ExperimentalDirective> {
    let mut found = Vec::new();
    for file in SourceFile::PERMISSION_FILES {
        let Some(text) = sources.get(file) else {
            continue;
        };
        found.extend(
            tokenize(text)
                .into_iter()
                .filter(|d| d.kind.is_experimental())
                .map(|d| ExperimentalDirective {
                    domain: sources.domain.clone(),
                    file,
                    directive: d.kind,
                    value: d.value.to_string(),
                    line: d.line,
                }),
        );
    }
    found
}
