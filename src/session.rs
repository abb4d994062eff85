//! Report directory layout for comparison artifacts.
//!
//! All persisted state of a harness run lives under one report root:
//! - `differences.json`: the difference ledger
//! - `DIFFERENCES-SUMMARY.md`: the rendered summary
//! - `screenshots/<scenario>/`: paired snapshots for each mismatching scenario

use std::fs;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config;

/// Paths of every artifact the harness writes
#[derive(Debug, Clone)]
pub struct ReportLayout {
    /// Root directory for this layout
    pub dir: PathBuf,
}

impl ReportLayout {
    /// Create a layout rooted at the configured report directory
    pub fn new() -> Self {
        Self::in_dir(config::report_dir())
    }

    /// Create a layout rooted at a specific directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the difference ledger
    pub fn ledger_path(&self) -> PathBuf {
        self.dir.join(config::LEDGER_FILE)
    }

    /// Path of the rendered summary
    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(config::SUMMARY_FILE)
    }

    /// Directory holding the snapshots of one scenario
    pub fn snapshot_dir(&self, scenario_id: &str) -> PathBuf {
        self.dir
            .join(config::SCREENSHOT_DIR)
            .join(sanitize_name(scenario_id))
    }

    /// Paths of the (baseline, candidate) snapshots of one scenario
    pub fn snapshot_paths(&self, scenario_id: &str) -> (PathBuf, PathBuf) {
        let dir = self.snapshot_dir(scenario_id);
        (
            dir.join(config::BASELINE_SNAPSHOT_FILE),
            dir.join(config::CANDIDATE_SNAPSHOT_FILE),
        )
    }

    /// Remove every snapshot directory, keeping the ledger and summary
    pub fn clear_snapshots(&self) -> std::io::Result<()> {
        let base = self.dir.join(config::SCREENSHOT_DIR);
        if base.exists() {
            fs::remove_dir_all(&base)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.dir
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize a name for use as a file or directory name.
///
/// Names that had to be rewritten get a short digest of the original appended,
/// so distinct names never share a directory.
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    // Never produce a path component that climbs out of the screenshot root
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        sanitized = sanitized.replace('.', "_") + "_";
    }

    if sanitized == name {
        sanitized
    } else {
        let digest = hex::encode(Sha256::digest(name.as_bytes()));
        format!("{}-{}", sanitized, &digest[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("W1-write-tmp"), "W1-write-tmp");
        assert_eq!(sanitize_name("v1.2_final"), "v1.2_final");
        assert!(sanitize_name("hello world").starts_with("hello_world-"));
        assert!(sanitize_name("a/b\\c").starts_with("a_b_c-"));
        assert!(sanitize_name("..").starts_with("___-"));
        assert!(sanitize_name("").starts_with("_-"));
        assert_eq!(sanitize_name("hello world").len(), "hello_world-".len() + 8);
    }

    #[test]
    fn test_rewritten_names_do_not_collide() {
        assert_ne!(sanitize_name("a/b"), sanitize_name("a_b"));
        assert_ne!(sanitize_name("a/b"), sanitize_name("a b"));

        let layout = ReportLayout::in_dir("/tmp/reports");
        assert_ne!(layout.snapshot_dir("a/b"), layout.snapshot_dir("a_b"));
        assert_eq!(layout.snapshot_dir("a_b"), PathBuf::from("/tmp/reports/screenshots/a_b"));
    }

    #[test]
    fn test_layout_paths() {
        let layout = ReportLayout::in_dir("/tmp/reports");
        assert_eq!(layout.ledger_path(), PathBuf::from("/tmp/reports/differences.json"));
        assert_eq!(
            layout.summary_path(),
            PathBuf::from("/tmp/reports/DIFFERENCES-SUMMARY.md")
        );
        let (baseline, candidate) = layout.snapshot_paths("B1-bash-echo");
        assert_eq!(
            baseline,
            PathBuf::from("/tmp/reports/screenshots/B1-bash-echo/old-app.png")
        );
        assert_eq!(
            candidate,
            PathBuf::from("/tmp/reports/screenshots/B1-bash-echo/spicy-claude.png")
        );

        let (baseline, _) = layout.snapshot_paths("B1 bash/echo");
        assert_eq!(baseline.file_name().unwrap(), "old-app.png");
        assert!(
            baseline
                .parent()
                .unwrap()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("B1_bash_echo-")
        );
    }

    #[test]
    fn test_clear_snapshots() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = ReportLayout::in_dir(tmp.path().join("absent"));
        assert!(layout.clear_snapshots().is_ok());

        let layout = ReportLayout::in_dir(tmp.path());
        fs::create_dir_all(layout.snapshot_dir("W1")).unwrap();
        fs::write(layout.ledger_path(), "[]").unwrap();
        layout.clear_snapshots().unwrap();
        assert!(!layout.snapshot_dir("W1").exists());
        assert!(layout.ledger_path().exists());
    }
}
