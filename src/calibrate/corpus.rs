use crate::error::{QscoreError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects benchmark project roots under the corpus. A directory counts as
/// a project root when it directly contains an entry whose name ends with
/// the marker; the first match along any path wins and nothing beneath an
/// already-claimed project is re-matched.
pub fn discover_projects(corpus_root: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let mut projects = Vec::new();
    let mut walker = WalkDir::new(corpus_root).min_depth(1).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry
            .map_err(|e| QscoreError::Calibration(format!("corpus walk failed: {e}")))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if contains_marker(entry.path(), marker)? {
            projects.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    if projects.is_empty() {
        return Err(QscoreError::Calibration(format!(
            "no project matching marker {marker} found under {}",
            corpus_root.display()
        )));
    }

    projects.sort();
    Ok(projects)
}

fn contains_marker(dir: &Path, marker: &str) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().ends_with(marker) {
            return Ok(true);
        }
    }
    Ok(false)
}
