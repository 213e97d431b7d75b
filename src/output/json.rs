//! Pretty JSON artifacts

use crate::output::{write_text, OutputResult};
use serde::Serialize;
use std::path::Path;

/// Serializes a document as pretty JSON with a trailing newline
///
/// Map-backed documents serialize with sorted keys, so identical input
/// always yields identical bytes.
pub fn to_json_string<T: Serialize>(value: &T) -> OutputResult<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Writes a document as pretty JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    write_text(path, &to_json_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diff_domain;
    use crate::permissions::{DomainPermissions, PermissionMap};
    use crate::snapshot::{DomainSources, SourceFile};
    use tempfile::TempDir;

    fn map() -> PermissionMap {
        let mut map = PermissionMap::new();
        for domain in ["b.com", "a.com"] {
            let sources = DomainSources::new(domain)
                .with(SourceFile::Robots, "User-agent: *\nDisallow: /x\n")
                .with(SourceFile::Ai, "User-agent: GPTBot\nAllow: /x\n");
            map.insert(domain, DomainPermissions::from_sources(&sources).unwrap());
        }
        map
    }

    #[test]
    fn test_keys_sorted_and_stable() {
        let first = to_json_string(&map()).unwrap();
        let second = to_json_string(&map()).unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"a.com\"").unwrap() < first.find("\"b.com\"").unwrap());
        assert!(first.ends_with("}\n"));
    }

    #[test]
    fn test_write_and_reload_map() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("permissions_map.json");
        write_json(&path, &map()).unwrap();

        let loaded = PermissionMap::load(&path).unwrap();
        assert_eq!(loaded, map());
    }

    #[test]
    fn test_diff_shape() {
        let map = map();
        let diff = diff_domain(map.get("a.com").unwrap());
        let json: serde_json::Value =
            serde_json::from_str(&to_json_string(&diff).unwrap()).unwrap();
        assert_eq!(json["GPTBot"]["allow_only_ai"][0], "/x");
        assert_eq!(json["*"]["disallow_only_robots"][0], "/x");
    }
}
