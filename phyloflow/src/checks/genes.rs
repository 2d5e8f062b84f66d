//! Gene-identifier cross-check between alignments and the reference table.

use super::reference::ReferenceTable;
use crate::errors::CheckError;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of a passing cross-check.
#[derive(Debug, Clone)]
pub struct GeneIdReport {
    /// Identifiers found in the alignment directory.
    pub aligned: Vec<String>,
    /// Reference identifiers not aligned in this run (soft difference).
    pub unaligned_reference: Vec<String>,
}

fn alignment_ids(msa_dir: &Path) -> Result<BTreeSet<String>, CheckError> {
    let entries = std::fs::read_dir(msa_dir)
        .map_err(|_| CheckError::NoAlignments(msa_dir.to_path_buf()))?;

    let ids: BTreeSet<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.strip_suffix(".fa")
                .filter(|stem| stem.starts_with("OG"))
                .map(ToString::to_string)
        })
        .collect();

    if ids.is_empty() {
        return Err(CheckError::NoAlignments(msa_dir.to_path_buf()));
    }
    Ok(ids)
}

/// Cross-checks alignment identifiers against the reference table.
///
/// Identifiers come from `OG*.fa` file names in `msa_dir` and from the
/// table's `OG` column. An aligned identifier missing from the table is
/// fatal; a table identifier missing from the alignments is only warned
/// about, since the reference table may legitimately list more genes than
/// were aligned in this run.
///
/// # Errors
///
/// [`CheckError::NoAlignments`] when no `OG*.fa` file exists, or
/// [`CheckError::UnknownAlignmentIds`] naming every offending identifier.
pub fn cross_check_gene_ids(
    msa_dir: &Path,
    reference: &ReferenceTable,
) -> Result<GeneIdReport, CheckError> {
    let aligned = alignment_ids(msa_dir)?;

    let missing: Vec<String> = aligned.difference(reference.ogs()).cloned().collect();
    if !missing.is_empty() {
        return Err(CheckError::UnknownAlignmentIds { ids: missing });
    }

    let unaligned: Vec<String> = reference.ogs().difference(&aligned).cloned().collect();
    if unaligned.is_empty() {
        info!(
            "gene-identifier cross-check passed: {} alignment(s) all listed in {}",
            aligned.len(),
            reference.path().display()
        );
    } else {
        warn!(
            "reference table lists {} gene group(s) without alignments in this run: {}",
            unaligned.len(),
            unaligned.join(", ")
        );
    }

    Ok(GeneIdReport {
        aligned: aligned.into_iter().collect(),
        unaligned_reference: unaligned,
    })
}
