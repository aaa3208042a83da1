use std::io::Write;

use crate::dedupe::ScanReport;

/// Paths one per line, a blank line after each group.
pub fn write_text(out: &mut impl Write, report: &ScanReport) -> std::io::Result<()> {
    for group in &report.groups {
        for path in &group.paths {
            writeln!(out, "{}", path.display())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_json(out: &mut impl Write, report: &ScanReport) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out).map_err(serde_json::Error::io)
}

/// One-line summary for stderr.
pub fn summary(report: &ScanReport) -> String {
    let duplicates: usize = report.groups.iter().map(|g| g.paths.len()).sum();
    let wasted: u64 = report
        .groups
        .iter()
        .map(|g| g.size * (g.paths.len() as u64 - 1))
        .sum();
    let mut line = format!(
        "{} files scanned, {} hashed, {} duplicate groups ({} files, {} reclaimable)",
        report.stats.files_seen,
        report.stats.files_hashed,
        report.groups.len(),
        duplicates,
        fmt_size(wasted),
    );
    if !report.skipped.is_empty() {
        line.push_str(&format!(", {} paths skipped", report.skipped.len()));
    }
    line
}

/// Human-readable byte size (e.g. "1.2 GB").
pub fn fmt_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedupe::{DuplicateGroup, ScanStats, SkippedPath};
    use crate::hash::Digest;
    use std::path::PathBuf;

    fn report() -> ScanReport {
        ScanReport {
            groups: vec![
                DuplicateGroup {
                    digest: Digest::from(blake3::hash(b"hello")),
                    size: 5,
                    paths: vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")],
                },
                DuplicateGroup {
                    digest: Digest::from(blake3::hash(b"x")),
                    size: 2048,
                    paths: vec![
                        PathBuf::from("c"),
                        PathBuf::from("d"),
                        PathBuf::from("e"),
                    ],
                },
            ],
            skipped: vec![SkippedPath {
                path: PathBuf::from("locked"),
                reason: "cannot read locked".to_string(),
            }],
            stats: ScanStats {
                roots: 1,
                files_seen: 9,
                files_hashed: 5,
                cache_hits: 3,
                bytes_hashed: 6154,
            },
        }
    }

    #[test]
    fn text_output_separates_groups_with_blank_lines() {
        let mut out = Vec::new();
        write_text(&mut out, &report()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a.txt\nb.txt\n\nc\nd\ne\n\n");
    }

    #[test]
    fn json_output_has_hex_digests() {
        let mut out = Vec::new();
        write_json(&mut out, &report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value["groups"][0]["digest"],
            blake3::hash(b"hello").to_hex().to_string()
        );
        assert_eq!(value["groups"][1]["paths"].as_array().unwrap().len(), 3);
        assert_eq!(value["stats"]["files_hashed"], 5);
    }

    #[test]
    fn summary_counts_reclaimable_bytes() {
        assert_eq!(
            summary(&report()),
            "9 files scanned, 5 hashed, 2 duplicate groups (5 files, 4.0 KB reclaimable), 1 paths skipped"
        );
    }

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(fmt_size(512), "512 B");
        assert_eq!(fmt_size(1536), "1.5 KB");
        assert_eq!(fmt_size(3 * 1024 * 1024), "3.0 MB");
    }
}
