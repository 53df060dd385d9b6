use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DatasetError;

/// Audio files directly inside `dir` whose extension matches, sorted by path.
///
/// Directory listing order differs across platforms, so the result is sorted
/// to keep dataset rows reproducible.
pub fn audio_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| DatasetError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
