//! Manifest statistics
//!
//! Counts how many domains carry each combination of permission files,
//! without reading any file content.

use crate::snapshot::ManifestStats;

fn percent(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats manifest statistics as an aligned table
///
/// # Arguments
///
/// * `stats` - Counts taken from the manifest
///
/// # Returns
///
/// One row per file combination with its count and share of all domains
pub fn format_manifest_statistics(stats: &ManifestStats) -> String {
    let rows: [(&str, u64); 10] = [
        ("Total domains", stats.total),
        ("No files", stats.none),
        ("robots.txt", stats.robots),
        ("ai.txt or llms.txt", stats.ai_or_llms),
        ("robots.txt and (ai.txt or llms.txt)", stats.robots_and_ai_or_llms),
        ("ai.txt", stats.ai),
        ("llms.txt", stats.llms),
        ("ai.txt and llms.txt", stats.ai_and_llms),
        ("robots.txt and ai.txt", stats.robots_and_ai),
        ("robots.txt and llms.txt", stats.robots_and_llms),
    ];

    let mut out = String::from("=== Manifest Statistics ===\n\n");
    for (label, count) in rows {
        out.push_str(&format!(
            "  {:38} {:>10} ({:5.1}%)\n",
            label,
            count,
            percent(count, stats.total)
        ));
    }
    out
}

/// Prints manifest statistics to stdout
pub fn print_manifest_statistics(stats: &ManifestStats) {
    print!("{}", format_manifest_statistics(stats));
}
