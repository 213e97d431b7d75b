//! Snapshot access
//!
//! A snapshot is one dated download of the corpus:
//!
//! ```text
//! <root>/YYYY-MM-DD/files/split_00000/<domain>/robots.txt
//!                                              ai.txt
//!                                              llms.txt
//! ```
//!
//! This module locates the snapshot, indexes its domain directories and
//! reads per-domain files. It never touches the network.

mod manifest;

pub use manifest::{FileSet, Manifest, ManifestStats};

use crate::directives::decode;
use crate::AuditError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

/// Date format of snapshot folder names
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d";

/// The three files audited per domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceFile {
    #[serde(rename = "robots.txt")]
    Robots,
    #[serde(rename = "ai.txt")]
    Ai,
    #[serde(rename = "llms.txt")]
    Llms,
}

impl SourceFile {
    /// The two files holding permission directives
    pub const PERMISSION_FILES: [SourceFile; 2] = [SourceFile::Robots, SourceFile::Ai];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Robots => "robots.txt",
            Self::Ai => "ai.txt",
            Self::Llms => "llms.txt",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "robots.txt" => Some(Self::Robots),
            "ai.txt" => Some(Self::Ai),
            "llms.txt" => Some(Self::Llms),
            _ => None,
        }
    }

    /// The URL the file is served from
    pub fn canonical_url(&self, domain: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("https://{}/{}", domain, self.file_name()))
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Decoded text of one domain's files
#[derive(Debug, Clone, Default)]
pub struct DomainSources {
    pub domain: String,
    pub robots: Option<String>,
    pub ai: Option<String>,
    pub llms: Option<String>,
}

impl DomainSources {
    /// Creates an empty source set for a domain
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Sets the text for one file (builder style, handy in tests)
    pub fn with(mut self, file: SourceFile, text: impl Into<String>) -> Self {
        self.set(file, Some(text.into()));
        self
    }

    pub fn set(&mut self, file: SourceFile, text: Option<String>) {
        match file {
            SourceFile::Robots => self.robots = text,
            SourceFile::Ai => self.ai = text,
            SourceFile::Llms => self.llms = text,
        }
    }

    pub fn get(&self, file: SourceFile) -> Option<&str> {
        match file {
            SourceFile::Robots => self.robots.as_deref(),
            SourceFile::Ai => self.ai.as_deref(),
            SourceFile::Llms => self.llms.as_deref(),
        }
    }
}

/// An opened, indexed snapshot
#[derive(Debug, Clone)]
pub struct Snapshot {
    date: NaiveDate,
    files_root: PathBuf,
    domains: HashMap<String, PathBuf>,
}

impl Snapshot {
    /// Opens a snapshot under `root`
    ///
    /// # Arguments
    ///
    /// * `root` - Directory holding dated snapshot folders
    /// * `pinned` - Specific date to use instead of the latest one
    ///
    /// # Returns
    ///
    /// * `Ok(Snapshot)` - Snapshot located and indexed
    /// * `Err(AuditError)` - Root, dated folder or `files/` is missing
    pub fn open(root: &Path, pinned: Option<NaiveDate>) -> Result<Self, AuditError> {
        let (date, folder) = match pinned {
            Some(date) => {
                let folder = root.join(date.format(SNAPSHOT_DATE_FORMAT).to_string());
                if !folder.is_dir() {
                    return Err(snapshot_error(&folder, "pinned snapshot folder does not exist"));
                }
                (date, folder)
            }
            None => find_latest_date_folder(root)?,
        };

        let files_root = folder.join("files");
        if !files_root.is_dir() {
            return Err(snapshot_error(&files_root, "expected a files/ directory"));
        }

        let domains = index_domains(&files_root)?;
        tracing::info!(
            "Opened snapshot {} ({} domain directories)",
            date,
            domains.len()
        );

        Ok(Self {
            date,
            files_root,
            domains,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn files_root(&self) -> &Path {
        &self.files_root
    }

    /// Number of indexed domain directories
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain_dir(&self, domain: &str) -> Option<&Path> {
        self.domains.get(domain).map(PathBuf::as_path)
    }

    /// Reads one file for a domain
    ///
    /// # Returns
    ///
    /// * `Ok(Some(text))` - File read and decoded
    /// * `Ok(None)` - Domain directory or file does not exist
    /// * `Err(AuditError)` - File exists but could not be read
    pub fn read_source(&self, domain: &str, file: SourceFile) -> Result<Option<String>, AuditError> {
        let Some(dir) = self.domain_dir(domain) else {
            return Ok(None);
        };

        match std::fs::read(dir.join(file.file_name())) {
            Ok(bytes) => Ok(Some(decode(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuditError::Domain {
                domain: domain.to_string(),
                message: format!("failed to read {}: {}", file, e),
            }),
        }
    }

    /// Reads every file the manifest lists for a domain
    pub fn load_sources(&self, domain: &str, files: FileSet) -> Result<DomainSources, AuditError> {
        let mut sources = DomainSources::new(domain);
        for file in [SourceFile::Robots, SourceFile::Ai, SourceFile::Llms] {
            if files.contains(file) {
                sources.set(file, self.read_source(domain, file)?);
            }
        }
        Ok(sources)
    }
}

fn snapshot_error(path: &Path, message: &str) -> AuditError {
    AuditError::Snapshot {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Finds the most recent `YYYY-MM-DD` folder under `root`
pub fn find_latest_date_folder(root: &Path) -> Result<(NaiveDate, PathBuf), AuditError> {
    let entries = std::fs::read_dir(root)
        .map_err(|e| snapshot_error(root, &format!("cannot list snapshot root: {}", e)))?;

    let mut latest: Option<(NaiveDate, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(name, SNAPSHOT_DATE_FORMAT) else {
            continue;
        };
        if latest.as_ref().map_or(true, |(best, _)| date > *best) {
            latest = Some((date, path));
        }
    }

    latest.ok_or_else(|| snapshot_error(root, "no YYYY-MM-DD snapshot folders found"))
}

/// Maps domain name to its directory across all split folders
///
/// Splits are visited in name order; the first split holding a domain wins.
fn index_domains(files_root: &Path) -> Result<HashMap<String, PathBuf>, AuditError> {
    let mut splits: Vec<PathBuf> = std::fs::read_dir(files_root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    splits.sort();

    let mut domains = HashMap::new();
    for split in splits {
        let entries = match std::fs::read_dir(&split) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping unreadable split {}: {}", split.display(), e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                domains.entry(name.to_string()).or_insert(path);
            }
        }
    }

    Ok(domains)
}
