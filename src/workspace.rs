//! Workspace Directories
//!
//! The server owns two directories under its base directory:
//!
//! - `tmp/`: scratch artifacts written by child processes (scan reports,
//!   resource scripts, pot files). Never cleaned up by the server.
//! - `log/`: server log file and background-launch logs.
//!
//! A [`Workspace`] is constructed once at startup and shared behind an `Arc`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Scratch directory name under the base directory
pub const SCRATCH_DIR_NAME: &str = "tmp";

/// Log directory name under the base directory
pub const LOG_DIR_NAME: &str = "log";

/// Process-wide scratch and log directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    base_dir: PathBuf,
    scratch_dir: PathBuf,
    log_dir: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at `base_dir`
    ///
    /// Nothing is created on disk until [`Workspace::ensure_directories`] runs.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            scratch_dir: base_dir.join(SCRATCH_DIR_NAME),
            log_dir: base_dir.join(LOG_DIR_NAME),
            base_dir,
        }
    }

    /// Directory holding the running executable, falling back to the current directory
    pub fn default_base() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the scratch and log directories (and parents) if absent
    ///
    /// # Errors
    ///
    /// Returns an error only if a directory cannot be created, e.g. on an
    /// unwritable filesystem. Pre-existing directories are not an error.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.scratch_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        tracing::debug!(
            scratch = %self.scratch_dir.display(),
            log = %self.log_dir.display(),
            "Workspace directories ready"
        );
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Scratch artifact path: `{scratch}/{stem}_{timestamp}{extension}`
    ///
    /// `extension` includes its leading dot, or is empty for prefixes and
    /// directories. Two calls with the same stem in the same second collide.
    pub fn artifact_path(&self, stem: &str, extension: &str, timestamp: i64) -> PathBuf {
        self.scratch_dir.join(stamped_name(stem, extension, timestamp))
    }

    /// Log file path: `{log}/{stem}_{timestamp}{extension}`
    pub fn log_path(&self, stem: &str, extension: &str, timestamp: i64) -> PathBuf {
        self.log_dir.join(stamped_name(stem, extension, timestamp))
    }
}

fn stamped_name(stem: &str, extension: &str, timestamp: i64) -> String {
    format!("{stem}_{timestamp}{extension}")
}

/// Current Unix time in whole seconds
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let ws = Workspace::new("/srv/kali");
        assert_eq!(ws.base_dir(), Path::new("/srv/kali"));
        assert_eq!(ws.scratch_dir(), Path::new("/srv/kali/tmp"));
        assert_eq!(ws.log_dir(), Path::new("/srv/kali/log"));
    }

    #[test]
    fn test_ensure_directories_creates_parents() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::new(temp.path().join("nested").join("base"));

        ws.ensure_directories().unwrap();

        assert!(ws.scratch_dir().is_dir());
        assert!(ws.log_dir().is_dir());
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::new(temp.path());

        ws.ensure_directories().unwrap();
        std::fs::write(ws.scratch_dir().join("keep.txt"), "data").unwrap();
        ws.ensure_directories().unwrap();

        assert!(ws.scratch_dir().join("keep.txt").exists());
    }

    #[test]
    fn test_ensure_directories_fails_when_base_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let ws = Workspace::new(&file);
        let err = ws.ensure_directories().unwrap_err();
        assert!(err.to_string().contains("Failed to create directory"));
    }

    #[test]
    fn test_artifact_and_log_paths() {
        let ws = Workspace::new("/base");
        assert_eq!(
            ws.artifact_path("nmap_scan", ".xml", 1700000000),
            PathBuf::from("/base/tmp/nmap_scan_1700000000.xml")
        );
        assert_eq!(
            ws.artifact_path("sqlmap_output", "", 42),
            PathBuf::from("/base/tmp/sqlmap_output_42")
        );
        assert_eq!(
            ws.log_path("burpsuite", ".log", 7),
            PathBuf::from("/base/log/burpsuite_7.log")
        );
    }

    #[test]
    fn test_artifact_paths_differ_across_seconds() {
        let ws = Workspace::new("/base");
        assert_ne!(
            ws.artifact_path("hydra_results", ".txt", 100),
            ws.artifact_path("hydra_results", ".txt", 101)
        );
        assert_ne!(
            ws.artifact_path("nikto_scan", ".txt", 100),
            ws.artifact_path("hydra_results", ".txt", 100)
        );
    }

    #[test]
    fn test_unix_timestamp_is_recent() {
        // 2023-11-14
        assert!(unix_timestamp() > 1_700_000_000);
    }
}
