//! Discovery of required files with deterministic ambiguity handling.
//!
//! Zero matches is fatal. Multiple matches are resolved deterministically
//! (search directories in fixed priority order, file names sorted) and the
//! selection is reported, never silent.

use crate::errors::ArtifactError;
use crate::layout::RootLayout;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Fails unless `path` is an existing, non-empty file.
///
/// # Errors
///
/// [`ArtifactError::FileMissing`] or [`ArtifactError::FileEmpty`].
pub fn require_file(path: &Path) -> Result<(), ArtifactError> {
    let meta = fs::metadata(path).map_err(|_| ArtifactError::FileMissing(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(ArtifactError::FileMissing(path.to_path_buf()));
    }
    if meta.len() == 0 {
        return Err(ArtifactError::FileEmpty(path.to_path_buf()));
    }
    Ok(())
}

/// Fails unless `path` is an existing directory with at least one entry.
///
/// # Errors
///
/// [`ArtifactError::DirMissing`] or [`ArtifactError::DirEmpty`].
pub fn require_dir(path: &Path) -> Result<(), ArtifactError> {
    let mut entries =
        fs::read_dir(path).map_err(|_| ArtifactError::DirMissing(path.to_path_buf()))?;
    if entries.next().is_none() {
        return Err(ArtifactError::DirEmpty(path.to_path_buf()));
    }
    Ok(())
}

/// Returns true when `path` is an existing file with content.
#[must_use]
pub fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

fn matching_files(dir: &Path, prefix: &str, suffix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix)
                && name.ends_with(suffix)
                && entry.file_type().map(|t| t.is_file()).unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();
    found.sort();
    found
}

/// Locates the concatenated alignment produced by the combine stage.
///
/// Searches the layout's candidate directories for `concat_*_<st>.phy`.
/// With several candidates the first one (directory priority order, then
/// lexicographic file order) is selected and the choice is logged as a
/// warning.
///
/// # Errors
///
/// [`ArtifactError::NoCandidate`] when nothing matches anywhere.
pub fn resolve_concatenated_alignment(layout: &RootLayout) -> Result<PathBuf, ArtifactError> {
    let suffix = format!("_{}.phy", layout.seq_type().lowercase());
    let pattern = format!("concat_*{suffix}");
    let search_dirs = layout.alignment_search_dirs();

    let candidates: Vec<PathBuf> = search_dirs
        .iter()
        .flat_map(|dir| matching_files(dir, "concat_", &suffix))
        .collect();

    match candidates.as_slice() {
        [] => Err(ArtifactError::NoCandidate {
            pattern,
            searched: search_dirs,
        }),
        [only] => Ok(only.clone()),
        [first, ..] => {
            warn!(
                "{} files match '{}'; using {}",
                candidates.len(),
                pattern,
                first.display()
            );
            Ok(first.clone())
        }
    }
}

/// Resolves the inferred tree, preferring `primary` over `fallback`.
///
/// A fallback selection is logged as a warning because it changes which
/// artifact downstream visualization consumes.
///
/// # Errors
///
/// [`ArtifactError::NoTreeFile`] when neither path is a non-empty file.
pub fn resolve_tree_file(primary: &Path, fallback: &Path) -> Result<PathBuf, ArtifactError> {
    if is_nonempty_file(primary) {
        return Ok(primary.to_path_buf());
    }
    if is_nonempty_file(fallback) {
        warn!(
            "primary tree {} absent or empty; falling back to {}",
            primary.display(),
            fallback.display()
        );
        return Ok(fallback.to_path_buf());
    }
    Err(ArtifactError::NoTreeFile {
        primary: primary.to_path_buf(),
        fallback: fallback.to_path_buf(),
    })
}
