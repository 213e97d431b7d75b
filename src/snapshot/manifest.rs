//! Domain manifest loading
//!
//! The manifest is a two-column CSV (`domain,files`) where `files` is a
//! semicolon-joined list of which permission files were downloaded for the
//! domain. It lets every stage skip files known to be absent.

use crate::snapshot::SourceFile;
use crate::AuditError;
use std::collections::BTreeMap;
use std::path::Path;

/// Which of the three files a domain has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSet {
    robots: bool,
    ai: bool,
    llms: bool,
}

impl FileSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from file kinds
    pub fn of(files: &[SourceFile]) -> Self {
        let mut set = Self::new();
        for file in files {
            set.insert(*file);
        }
        set
    }

    pub fn insert(&mut self, file: SourceFile) {
        match file {
            SourceFile::Robots => self.robots = true,
            SourceFile::Ai => self.ai = true,
            SourceFile::Llms => self.llms = true,
        }
    }

    pub fn contains(&self, file: SourceFile) -> bool {
        match file {
            SourceFile::Robots => self.robots,
            SourceFile::Ai => self.ai,
            SourceFile::Llms => self.llms,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.robots || self.ai || self.llms)
    }

    pub fn union(&mut self, other: FileSet) {
        self.robots |= other.robots;
        self.ai |= other.ai;
        self.llms |= other.llms;
    }

    /// Has at least one of the two permission files
    pub fn has_any_permission_file(&self) -> bool {
        self.robots || self.ai
    }

    /// Has both permission files
    pub fn has_both_permission_files(&self) -> bool {
        self.robots && self.ai
    }
}

/// Parsed manifest, sorted by domain
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, FileSet>,
}

impl Manifest {
    /// Loads the manifest from disk
    ///
    /// A missing or unreadable manifest is fatal for a run.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Manifest(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses manifest content
    ///
    /// The first non-empty line must be a header naming the `domain` and
    /// `files` columns. File names other than the three known ones are
    /// ignored; repeated domains union their file sets.
    pub fn parse(content: &str) -> Result<Self, AuditError> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| AuditError::Manifest("manifest is empty".to_string()))?;
        let columns: Vec<String> = split_row(header)
            .into_iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let domain_col = column_index(&columns, "domain")?;
        let files_col = column_index(&columns, "files")?;

        let mut entries: BTreeMap<String, FileSet> = BTreeMap::new();
        for line in lines {
            let fields = split_row(line);
            let Some(domain) = fields.get(domain_col).filter(|d| !d.is_empty()) else {
                continue;
            };

            let mut files = FileSet::new();
            if let Some(listed) = fields.get(files_col) {
                listed
                    .split(';')
                    .filter_map(|name| SourceFile::from_file_name(name.trim()))
                    .for_each(|file| files.insert(file));
            }

            entries.entry(domain.to_string()).or_default().union(files);
        }

        Ok(Self { entries })
    }

    /// Number of domains listed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files listed for a domain
    pub fn files(&self, domain: &str) -> Option<FileSet> {
        self.entries.get(domain).copied()
    }

    /// Iterates domains in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, FileSet)> {
        self.entries.iter().map(|(d, f)| (d.as_str(), *f))
    }

    fn select(&self, keep: impl Fn(&FileSet) -> bool) -> Vec<(String, FileSet)> {
        self.entries
            .iter()
            .filter(|(_, files)| keep(files))
            .map(|(d, f)| (d.clone(), *f))
            .collect()
    }

    /// Domains fed to the permission stages
    pub fn permission_domains(&self, include_partial: bool) -> Vec<(String, FileSet)> {
        if include_partial {
            self.select(FileSet::has_any_permission_file)
        } else {
            self.select(FileSet::has_both_permission_files)
        }
    }

    /// Domains scanned for experimental directives
    pub fn directive_domains(&self) -> Vec<(String, FileSet)> {
        self.select(FileSet::has_any_permission_file)
    }

    /// Domains whose content index is cross-checked
    pub fn cross_reference_domains(&self) -> Vec<(String, FileSet)> {
        self.select(|f| f.contains(SourceFile::Llms) && f.has_any_permission_file())
    }
}

fn column_index(columns: &[String], name: &str) -> Result<usize, AuditError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| AuditError::Manifest(format!("header is missing the '{}' column", name)))
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .collect()
}

/// File-presence counts over the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestStats {
    pub total: u64,
    pub none: u64,
    pub robots: u64,
    pub ai_or_llms: u64,
    pub robots_and_ai_or_llms: u64,
    pub ai: u64,
    pub llms: u64,
    pub ai_and_llms: u64,
    pub robots_and_ai: u64,
    pub robots_and_llms: u64,
}

impl ManifestStats {
    /// Counts file combinations across every manifest row
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut stats = Self::default();
        for (_, files) in manifest.iter() {
            let robots = files.contains(SourceFile::Robots);
            let ai = files.contains(SourceFile::Ai);
            let llms = files.contains(SourceFile::Llms);

            stats.total += 1;
            stats.none += u64::from(files.is_empty());
            stats.robots += u64::from(robots);
            stats.ai_or_llms += u64::from(ai || llms);
            stats.robots_and_ai_or_llms += u64::from(robots && (ai || llms));
            stats.ai += u64::from(ai);
            stats.llms += u64::from(llms);
            stats.ai_and_llms += u64::from(ai && llms);
            stats.robots_and_ai += u64::from(robots && ai);
            stats.robots_and_llms += u64::from(robots && llms);
        }
        stats
    }
}
