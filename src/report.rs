use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{BgReplaceError, Result};

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Files with the output extension found in the output directory after the
    /// run. Can exceed `succeeded` when earlier runs left outputs behind.
    pub outputs_on_disk: usize,
    pub output_dir: PathBuf,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Successful: {}", self.succeeded)?;
        writeln!(f, "Failed/Skipped: {}", self.failed)?;
        write!(
            f,
            "Unique outputs: {} (in {})",
            self.outputs_on_disk,
            self.output_dir.display()
        )
    }
}

/// Counts regular files directly in `dir` whose extension matches `ext`
/// (case-insensitive).
pub fn count_outputs(dir: &Path, ext: &str) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| BgReplaceError::FileSystem {
            path: dir.to_path_buf(),
            operation: "output directory scan".to_string(),
            source: e.into(),
        })?;
        let matches = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches {
            count += 1;
        }
    }
    Ok(count)
}
