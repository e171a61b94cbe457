// src/discovery.rs
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::constants::should_prune;

/// Recursively enumerates source files under `root`.
///
/// Directories named in `scan.exclude_dirs` are never entered. Entries are
/// visited depth-first in file-name order, so repeated runs over an
/// unchanged tree yield the same list. Walk errors are logged and skipped.
#[must_use]
pub fn find_project_files(root: &Path, scan: &ScanConfig) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !should_prune(&e.file_name().to_string_lossy(), &scan.exclude_dirs)
        });

    let (paths, error_count) = accumulate_walker(walker, &scan.extensions);
    if error_count > 0 {
        tracing::warn!("encountered {error_count} errors while scanning {}", root.display());
    }
    paths
}

fn accumulate_walker<I>(walker: I, extensions: &[String]) -> (Vec<PathBuf>, usize)
where
    I: Iterator<Item = walkdir::Result<walkdir::DirEntry>>,
{
    let mut paths = Vec::new();
    let mut errors = 0;
    for item in walker {
        match item {
            Ok(entry) => {
                if entry.file_type().is_file() && has_source_extension(entry.path(), extensions) {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => {
                tracing::debug!("walk error: {e}");
                errors += 1;
            }
        }
    }
    (paths, errors)
}

fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

/// Path of `file` relative to `root`, with forward slashes.
#[must_use]
pub fn relative_path(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.to_string_lossy().replace('\\', "/")
}
