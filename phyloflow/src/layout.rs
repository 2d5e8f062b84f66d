//! Fixed filesystem layout under the output root.
//!
//! All path derivation lives here so no component computes paths ad hoc.

use crate::config::SeqType;
use std::path::{Path, PathBuf};

/// Prior-stage results directory name.
pub const RESULTS_DIR: &str = "O2T_RESULTS";

/// Marker-genes directory name.
pub const MARKER_GENES_DIR: &str = "marker_genes";

/// DNA reference file name.
pub const DNA_REFERENCE: &str = "dna_ref.fa";

/// Sample-to-identifier mapping file name.
pub const FIVE_LETTER_FILE: &str = "five_letter_taxon.tsv";

/// Gene-entropy reference table file name.
pub const OG_GENE_TABLE: &str = "og_gene_table.csv";

/// Paths of one run, derived once from the output root and sequence type.
#[derive(Debug, Clone)]
pub struct RootLayout {
    root: PathBuf,
    seq_type: SeqType,
}

impl RootLayout {
    /// Builds the layout for a run.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, seq_type: SeqType) -> Self {
        Self {
            root: root.into(),
            seq_type,
        }
    }

    /// The output root itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The run's sequence type.
    #[must_use]
    pub const fn seq_type(&self) -> SeqType {
        self.seq_type
    }

    /// Prior-stage results directory.
    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    /// Marker-genes directory.
    #[must_use]
    pub fn marker_genes_dir(&self) -> PathBuf {
        self.root.join(MARKER_GENES_DIR)
    }

    /// DNA reference file.
    #[must_use]
    pub fn dna_reference(&self) -> PathBuf {
        self.root.join(DNA_REFERENCE)
    }

    /// Sample-to-identifier mapping file.
    #[must_use]
    pub fn five_letter_file(&self) -> PathBuf {
        self.root.join(FIVE_LETTER_FILE)
    }

    /// Gene-entropy reference table.
    #[must_use]
    pub fn og_gene_table(&self) -> PathBuf {
        self.root.join(OG_GENE_TABLE)
    }

    /// Per-OG alignment directory for the run's sequence type.
    #[must_use]
    pub fn msa_dir(&self) -> PathBuf {
        self.results_dir()
            .join("MSA")
            .join(self.seq_type.uppercase())
    }

    /// Directories searched for the concatenated alignment, in priority
    /// order.
    #[must_use]
    pub fn alignment_search_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.results_dir().join("merge_all_samples"),
            self.results_dir(),
        ]
    }

    /// Statistics directory.
    #[must_use]
    pub fn statistics_dir(&self) -> PathBuf {
        self.root.join("statistics")
    }

    /// Entropy subdirectory of the statistics directory.
    #[must_use]
    pub fn entropy_dir(&self) -> PathBuf {
        self.statistics_dir().join("entropy")
    }

    /// Position table produced by the extraction stage.
    #[must_use]
    pub fn positions_table(&self) -> PathBuf {
        self.entropy_dir()
            .join(format!("positions_{}.csv", self.seq_type.lowercase()))
    }

    /// Entropy table produced by the entropy stage.
    #[must_use]
    pub fn entropy_table(&self) -> PathBuf {
        self.entropy_dir()
            .join(format!("entropy_{}.csv", self.seq_type.lowercase()))
    }

    /// Machine-readable run report.
    #[must_use]
    pub fn run_report(&self) -> PathBuf {
        self.statistics_dir().join("run_report.json")
    }

    /// Visualization directory.
    #[must_use]
    pub fn visualization_dir(&self) -> PathBuf {
        self.root.join("visualization")
    }

    /// Prepared metadata consumed by the renderer.
    #[must_use]
    pub fn view_metadata(&self) -> PathBuf {
        self.visualization_dir().join("metadata_view.csv")
    }

    /// Relabeled tree written next to the inferred tree.
    #[must_use]
    pub fn relabeled_tree(tree: &Path) -> PathBuf {
        let stem = tree
            .file_stem()
            .map_or_else(|| "tree".to_string(), |s| s.to_string_lossy().into_owned());
        tree.with_file_name(format!("{stem}_relabel.nwk"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derives_fixed_paths() {
        let layout = RootLayout::new("/run", SeqType::Aa);
        assert_eq!(layout.results_dir(), PathBuf::from("/run/O2T_RESULTS"));
        assert_eq!(layout.msa_dir(), PathBuf::from("/run/O2T_RESULTS/MSA/AA"));
        assert_eq!(
            layout.positions_table(),
            PathBuf::from("/run/statistics/entropy/positions_aa.csv")
        );
        assert_eq!(
            layout.entropy_table(),
            PathBuf::from("/run/statistics/entropy/entropy_aa.csv")
        );
        assert_eq!(
            layout.view_metadata(),
            PathBuf::from("/run/visualization/metadata_view.csv")
        );
    }

    #[test]
    fn seq_type_switches_msa_dir_and_tables() {
        let layout = RootLayout::new("/run", SeqType::Dna);
        assert_eq!(layout.msa_dir(), PathBuf::from("/run/O2T_RESULTS/MSA/DNA"));
        assert_eq!(
            layout.entropy_table(),
            PathBuf::from("/run/statistics/entropy/entropy_dna.csv")
        );
    }

    #[test]
    fn search_dirs_prefer_merge_all_samples() {
        let layout = RootLayout::new("/run", SeqType::Aa);
        let dirs = layout.alignment_search_dirs();
        assert_eq!(dirs[0], PathBuf::from("/run/O2T_RESULTS/merge_all_samples"));
        assert_eq!(dirs[1], PathBuf::from("/run/O2T_RESULTS"));
    }

    #[test]
    fn relabeled_tree_sits_next_to_the_tree() {
        let tree = PathBuf::from("/run/O2T_RESULTS/concat_merge_aa.phy.treefile");
        assert_eq!(
            RootLayout::relabeled_tree(&tree),
            PathBuf::from("/run/O2T_RESULTS/concat_merge_aa.phy_relabel.nwk")
        );
    }
}
