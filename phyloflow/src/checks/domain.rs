//! Validation of the optional domain annotation table.
//!
//! The table is accepted or the run aborts; acceptance does not imply the
//! renderer consumes it (it currently does not), the check exists to surface
//! user error before hours of compute.

use super::reference::ReferenceTable;
use crate::errors::CheckError;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

const REQUIRED_COLUMNS: [&str; 4] = ["gene", "domain", "start", "end"];

/// Validates the domain annotation table against the reference gene names.
///
/// Required columns (matched case-insensitively): `gene`, `domain`, `start`,
/// `end`. Every row must satisfy `start > 0`, `end > 0`, `end >= start` with
/// numeric coordinates, and name a gene present in the reference table.
/// Returns the number of accepted rows.
///
/// # Errors
///
/// A [`CheckError`] listing every offending row or gene value.
pub fn validate_domain_table(
    path: &Path,
    reference: &ReferenceTable,
) -> Result<usize, CheckError> {
    let unreadable = |reason: String| CheckError::DomainUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| unreadable(e.to_string()))?;
    let headers = reader.headers().map_err(|e| unreadable(e.to_string()))?.clone();

    let mut indices = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, wanted) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        {
            Some(idx) => *slot = idx,
            None => missing.push(wanted.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(CheckError::DomainColumnsMissing {
            path: path.to_path_buf(),
            missing,
        });
    }
    let [gene_idx, _domain_idx, start_idx, end_idx] = indices;

    let mut row_count = 0usize;
    let mut bad_rows = Vec::new();
    let mut unknown_genes = BTreeSet::new();

    for record in reader.records() {
        let record = record.map_err(|e| unreadable(e.to_string()))?;
        row_count += 1;
        let row = row_count;

        let gene = record.get(gene_idx).map(str::trim).unwrap_or_default();
        let start_raw = record.get(start_idx).map(str::trim).unwrap_or_default();
        let end_raw = record.get(end_idx).map(str::trim).unwrap_or_default();

        let start = start_raw.parse::<f64>();
        let end = end_raw.parse::<f64>();
        match (&start, &end) {
            (Err(_), _) => {
                bad_rows.push(format!("row {row}: start '{start_raw}' is not numeric"));
            }
            (_, Err(_)) => {
                bad_rows.push(format!("row {row}: end '{end_raw}' is not numeric"));
            }
            (Ok(s), Ok(e)) => {
                if *s <= 0.0 || *e <= 0.0 {
                    bad_rows.push(format!(
                        "row {row}: coordinates must be positive (start={s}, end={e})"
                    ));
                } else if e < s {
                    bad_rows.push(format!("row {row}: end {e} is before start {s}"));
                }
            }
        }

        if gene.is_empty() {
            bad_rows.push(format!("row {row}: empty gene name"));
        } else if !reference.contains_gene(gene) {
            unknown_genes.insert(gene.to_string());
        }
    }

    if row_count == 0 {
        return Err(CheckError::DomainTableEmpty(path.to_path_buf()));
    }
    if !bad_rows.is_empty() {
        return Err(CheckError::DomainInvalidRows {
            path: path.to_path_buf(),
            rows: bad_rows,
        });
    }
    if !unknown_genes.is_empty() {
        return Err(CheckError::DomainUnknownGenes {
            path: path.to_path_buf(),
            genes: unknown_genes.into_iter().collect(),
        });
    }

    info!(
        "domain table {} accepted: {} row(s)",
        path.display(),
        row_count
    );
    Ok(row_count)
}
