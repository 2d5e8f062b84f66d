//! The OG-to-gene reference table shared by both checks.

use crate::errors::CheckError;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reference data loaded once per run from the gene-entropy table.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    path: PathBuf,
    /// Ortholog-group identifiers, ordered for stable reporting.
    ogs: BTreeSet<String>,
    /// Gene names referenced by the domain annotation check.
    genes: HashSet<String>,
}

impl ReferenceTable {
    /// Loads the table, matching the `OG` and `gene` headers
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// [`CheckError::ReferenceTable`] when the file is unreadable, a header
    /// is missing or no data rows remain.
    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let fail = |reason: String| CheckError::ReferenceTable {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::Reader::from_path(path).map_err(|e| fail(e.to_string()))?;
        let headers = reader.headers().map_err(|e| fail(e.to_string()))?.clone();
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };
        let og_idx = find("og").ok_or_else(|| fail("missing 'OG' column".to_string()))?;
        let gene_idx = find("gene").ok_or_else(|| fail("missing 'gene' column".to_string()))?;

        let mut ogs = BTreeSet::new();
        let mut genes = HashSet::new();
        for record in reader.records() {
            let record = record.map_err(|e| fail(e.to_string()))?;
            if let Some(og) = record.get(og_idx).map(str::trim).filter(|v| !v.is_empty()) {
                ogs.insert(og.to_string());
            }
            if let Some(gene) = record.get(gene_idx).map(str::trim).filter(|v| !v.is_empty()) {
                genes.insert(gene.to_string());
            }
        }
        if ogs.is_empty() {
            return Err(fail("no data rows".to_string()));
        }
        debug!(
            "loaded reference table {}: {} OGs, {} gene names",
            path.display(),
            ogs.len(),
            genes.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            ogs,
            genes,
        })
    }

    /// The table's path, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The ortholog-group identifiers listed in the table.
    #[must_use]
    pub const fn ogs(&self) -> &BTreeSet<String> {
        &self.ogs
    }

    /// Whether `gene` appears in the table's gene column.
    #[must_use]
    pub fn contains_gene(&self, gene: &str) -> bool {
        self.genes.contains(gene)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn loads_ogs_and_genes() {
        let dir = tempfile::tempdir().unwrap();
        let table = test_support::table_with(
            dir.path(),
            &[("OG1", "core"), ("OG2", "E1"), ("OG2", "E1")],
        );
        assert_eq!(
            table.ogs().iter().cloned().collect::<Vec<_>>(),
            vec!["OG1".to_string(), "OG2".to_string()]
        );
        assert!(table.contains_gene("E1"));
        assert!(!table.contains_gene("NS3"));
    }

    #[test]
    fn headers_match_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "og,Gene").unwrap();
        writeln!(file, "OG7,NS5B").unwrap();
        drop(file);

        let table = ReferenceTable::load(&path).unwrap();
        assert!(table.ogs().contains("OG7"));
        assert!(table.contains_gene("NS5B"));
    }

    #[test]
    fn missing_gene_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "OG,peptide\nOG1,x\n").unwrap();

        let err = ReferenceTable::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing 'gene' column"));
    }

    #[test]
    fn empty_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "OG,gene\n").unwrap();

        let err = ReferenceTable::load(&path).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }
}
