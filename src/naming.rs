//! Collision-free output file names.
//!
//! Outputs are named after their source image. When `photo.png` already
//! exists in the output directory the next free name out of `photo_1.png`,
//! `photo_2.png`, ... is used, so earlier runs are never overwritten.

use std::path::{Path, PathBuf};

/// First path of the form `dir/base.ext` or `dir/base_N.ext` that does not exist.
///
/// Only checks for existence; nothing is created.
pub fn unique_output_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{base}.{ext}"));
    if !candidate.exists() {
        return candidate;
    }

    (1u64..)
        .map(|counter| dir.join(format!("{base}_{counter}.{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(candidate)
}
