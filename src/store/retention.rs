//! Process log retention
//!
//! The process log directory gains one timestamped file per run. Before a
//! new run opens its file, the oldest files are deleted so the directory
//! stays under the configured cap.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, StoreError};

/// Deletes the oldest process log files to stay under a file-count cap
pub struct LogRetention {
    max_files: usize,
}

impl LogRetention {
    pub fn new(max_files: usize) -> Self {
        Self { max_files }
    }

    /// Trim `dir` down to one file fewer than the cap, leaving a slot for
    /// the upcoming run's log
    ///
    /// Timestamped names sort chronologically, so sorting by filename
    /// descending puts the newest first. Files that refuse to delete are
    /// skipped with a WARN and do not count toward the total.
    ///
    /// Returns the number of files deleted.
    pub fn apply(&self, dir: &Path) -> Result<usize> {
        if self.max_files == 0 || !dir.exists() {
            return Ok(0);
        }

        let mut files = self.list_log_files(dir)?;
        let keep = self.max_files - 1;
        if files.len() <= keep {
            return Ok(0);
        }

        // Sort by filename descending (newest first)
        files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

        let mut deleted = 0;
        for path in &files[keep..] {
            match fs::remove_file(path) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete stale log file, skipping");
                }
            }
        }

        info!(deleted, dir = %dir.display(), "trimmed process log directory");
        Ok(deleted)
    }

    fn list_log_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}
