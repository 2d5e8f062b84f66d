//! Typed argument builders, one per collaborator.
//!
//! Each collaborator documents the argument shape it expects; building the
//! list through a struct keeps the order fixed in one place instead of
//! scattered string concatenation.

use super::ToolInvocation;
use crate::config::{SeqType, ToolPaths};
use std::path::{Path, PathBuf};

/// Metadata validator run during preflight.
pub const VALIDATE_METADATA_SCRIPT: &str = "validate_metadata.py";

/// Tree relabeling and view-metadata preparation.
pub const PREPARE_VIEW_SCRIPT: &str = "prepare_metadata_o2t_view.py";

/// Visualization renderer.
pub const TREE_VIEW_SCRIPT: &str = "omni2treeview.py";

/// HTML template consumed by the renderer.
pub const TREE_VIEW_TEMPLATE: &str = "tree_view_template.html";

/// Position-table extractor.
pub const POSITION_TABLE_SCRIPT: &str = "msa_to_position_table.py";

/// Entropy calculator.
pub const ENTROPY_SCRIPT: &str = "position_entropy.py";

/// Entropy plotter.
pub const PLOT_SCRIPT: &str = "plot_entropy.py";

/// Every helper file the scripts directory must provide.
#[must_use]
pub fn helper_scripts() -> [&'static str; 7] {
    [
        VALIDATE_METADATA_SCRIPT,
        PREPARE_VIEW_SCRIPT,
        TREE_VIEW_SCRIPT,
        TREE_VIEW_TEMPLATE,
        POSITION_TABLE_SCRIPT,
        ENTROPY_SCRIPT,
        PLOT_SCRIPT,
    ]
}

/// Combine step: merge per-sample marker genes into one alignment set.
#[derive(Debug, Clone)]
pub struct CombineInvocation {
    /// Marker-genes directory.
    pub marker_genes: PathBuf,
    /// DNA reference file.
    pub dna_reference: PathBuf,
    /// Prior-stage results directory the tool extends.
    pub output_path: PathBuf,
}

impl CombineInvocation {
    /// Builds the `read2tree` command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        ToolInvocation::new("read2tree combine", &tools.read2tree)
            .arg("--standalone_path")
            .path_arg(&self.marker_genes)
            .arg("--dna_reference")
            .path_arg(&self.dna_reference)
            .arg("--output_path")
            .path_arg(&self.output_path)
            .arg("--merge_all_samples")
    }
}

/// Tree inference over the concatenated alignment.
#[derive(Debug, Clone)]
pub struct TreeInferenceInvocation {
    /// Worker threads for the external tool (passed through uninterpreted).
    pub threads: usize,
    /// Alignment path, doubling as the output prefix.
    pub alignment: PathBuf,
    /// Bootstrap replicates; 0 disables bootstrapping.
    pub bootstrap: u32,
}

impl TreeInferenceInvocation {
    /// Builds the `iqtree2` command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        let mut invocation = ToolInvocation::new("iqtree2", &tools.iqtree)
            .arg("-T")
            .arg(self.threads.to_string())
            .arg("-s")
            .path_arg(&self.alignment)
            .arg("--prefix")
            .path_arg(&self.alignment);
        if self.bootstrap > 0 {
            invocation = invocation.arg("-B").arg(self.bootstrap.to_string());
        }
        invocation
    }
}

fn script(tools: &ToolPaths, label: &'static str, scripts_dir: &Path, name: &str) -> ToolInvocation {
    ToolInvocation::new(label, &tools.python).path_arg(scripts_dir.join(name))
}

/// Metadata validator run during preflight, before expensive stages.
#[derive(Debug, Clone)]
pub struct MetadataValidateInvocation {
    /// Helper-script directory.
    pub scripts_dir: PathBuf,
    /// Sample metadata CSV.
    pub metadata: PathBuf,
    /// Sample-to-identifier mapping file.
    pub five_letter: PathBuf,
    /// Prior-stage results directory.
    pub results_dir: PathBuf,
}

impl MetadataValidateInvocation {
    /// Builds the validator command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        script(tools, "validate_metadata", &self.scripts_dir, VALIDATE_METADATA_SCRIPT)
            .arg("-m")
            .path_arg(&self.metadata)
            .arg("--five_letter")
            .path_arg(&self.five_letter)
            .arg("--o2t_results")
            .path_arg(&self.results_dir)
    }
}

/// Tree relabeling plus view-metadata preparation.
#[derive(Debug, Clone)]
pub struct MetadataPrepInvocation {
    /// Helper-script directory.
    pub scripts_dir: PathBuf,
    /// Sample metadata CSV.
    pub metadata: PathBuf,
    /// Sample-to-identifier mapping file.
    pub five_letter: PathBuf,
    /// Inferred tree to relabel.
    pub input_tree: PathBuf,
    /// Relabeled tree to write.
    pub output_tree: PathBuf,
    /// Prepared metadata to write.
    pub output_metadata: PathBuf,
}

impl MetadataPrepInvocation {
    /// Builds the preparation command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        script(tools, "prepare_metadata", &self.scripts_dir, PREPARE_VIEW_SCRIPT)
            .arg("-m")
            .path_arg(&self.metadata)
            .arg("--five_letter")
            .path_arg(&self.five_letter)
            .arg("--in_nwk")
            .path_arg(&self.input_tree)
            .arg("--out_nwk")
            .path_arg(&self.output_tree)
            .arg("--out_meta")
            .path_arg(&self.output_metadata)
    }
}

/// Visualization renderer.
///
/// The domain annotation table is deliberately not part of this contract:
/// the renderer does not consume it yet, the early check only surfaces bad
/// input before compute is spent.
#[derive(Debug, Clone)]
pub struct TreeViewInvocation {
    /// Helper-script directory (also provides the HTML template).
    pub scripts_dir: PathBuf,
    /// Relabeled tree.
    pub tree: PathBuf,
    /// Prepared metadata.
    pub metadata: PathBuf,
    /// Sanitized run label.
    pub label: String,
    /// Prefix for rendered outputs.
    pub output_prefix: PathBuf,
}

impl TreeViewInvocation {
    /// Builds the renderer command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        script(tools, "tree view", &self.scripts_dir, TREE_VIEW_SCRIPT)
            .arg("--tree")
            .path_arg(&self.tree)
            .arg("--metadata")
            .path_arg(&self.metadata)
            .arg("--template")
            .path_arg(self.scripts_dir.join(TREE_VIEW_TEMPLATE))
            .arg("--label")
            .arg(self.label.clone())
            .arg("--output_prefix")
            .path_arg(&self.output_prefix)
    }
}

/// Position-table extraction from the per-OG alignments.
#[derive(Debug, Clone)]
pub struct PositionTableInvocation {
    /// Helper-script directory.
    pub scripts_dir: PathBuf,
    /// Per-OG alignment directory.
    pub msa_dir: PathBuf,
    /// OG-to-gene reference table.
    pub og_table: PathBuf,
    /// Position table to write.
    pub output: PathBuf,
    /// Sequence type (uppercase token on the wire).
    pub seq_type: SeqType,
    /// Sample metadata CSV.
    pub metadata: PathBuf,
    /// Sample-to-identifier mapping file.
    pub five_letter: PathBuf,
    /// Optional sample-id exclusion pattern.
    pub exclude_pattern: Option<String>,
    /// Optional metadata (column, value) filter.
    pub filter: Option<(String, String)>,
}

impl PositionTableInvocation {
    /// Builds the extractor command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        let mut invocation =
            script(tools, "position table", &self.scripts_dir, POSITION_TABLE_SCRIPT)
                .arg("--msa_dir")
                .path_arg(&self.msa_dir)
                .arg("--og_table")
                .path_arg(&self.og_table)
                .arg("--output")
                .path_arg(&self.output)
                .arg("--seq_type")
                .arg(self.seq_type.uppercase())
                .arg("--metadata")
                .path_arg(&self.metadata)
                .arg("--metadata_match_column")
                .arg("label")
                .arg("--five_letter")
                .path_arg(&self.five_letter);
        if let Some(ref pattern) = self.exclude_pattern {
            invocation = invocation.arg("--exclude_pattern").arg(pattern.clone());
        }
        if let Some((ref column, ref value)) = self.filter {
            invocation = invocation
                .arg("--filter_column")
                .arg(column.clone())
                .arg("--filter_value")
                .arg(value.clone());
        }
        invocation
    }
}

/// Entropy computation over the position table.
#[derive(Debug, Clone)]
pub struct EntropyInvocation {
    /// Helper-script directory.
    pub scripts_dir: PathBuf,
    /// Position table produced by the extraction stage.
    pub positions: PathBuf,
    /// Entropy table to write.
    pub output: PathBuf,
    /// Sample metadata CSV.
    pub metadata: PathBuf,
    /// Optional group-by column list.
    pub group_by: Option<Vec<String>>,
    /// Optional minimum-sample threshold.
    pub min_samples: Option<u32>,
    /// Drop gap characters before computing entropy.
    pub exclude_gaps: bool,
}

impl EntropyInvocation {
    /// Builds the entropy command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        let mut invocation = script(tools, "entropy", &self.scripts_dir, ENTROPY_SCRIPT)
            .arg("--input")
            .path_arg(&self.positions)
            .arg("--output")
            .path_arg(&self.output)
            .arg("--metadata")
            .path_arg(&self.metadata);
        if let Some(ref columns) = self.group_by {
            invocation = invocation.arg("--group_by").arg(columns.join(","));
        }
        if let Some(min_samples) = self.min_samples {
            invocation = invocation.arg("--min_samples").arg(min_samples.to_string());
        }
        if self.exclude_gaps {
            invocation = invocation.arg("--exclude_gaps");
        }
        invocation
    }
}

/// Plotting of the entropy table.
#[derive(Debug, Clone)]
pub struct PlotInvocation {
    /// Helper-script directory.
    pub scripts_dir: PathBuf,
    /// Entropy table.
    pub entropy: PathBuf,
    /// Directory receiving the plots.
    pub output_dir: PathBuf,
    /// Sequence type (uppercase token on the wire).
    pub seq_type: SeqType,
}

impl PlotInvocation {
    /// Builds the plot command.
    #[must_use]
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        script(tools, "entropy plot", &self.scripts_dir, PLOT_SCRIPT)
            .arg("--entropy")
            .path_arg(&self.entropy)
            .arg("--output_dir")
            .path_arg(&self.output_dir)
            .arg("--seq_type")
            .arg(self.seq_type.uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tools() -> ToolPaths {
        ToolPaths::default()
    }

    #[test]
    fn combine_argument_order() {
        let invocation = CombineInvocation {
            marker_genes: PathBuf::from("/run/marker_genes"),
            dna_reference: PathBuf::from("/run/dna_ref.fa"),
            output_path: PathBuf::from("/run/O2T_RESULTS"),
        }
        .invocation(&tools());

        assert_eq!(
            invocation.args(),
            [
                "--standalone_path",
                "/run/marker_genes",
                "--dna_reference",
                "/run/dna_ref.fa",
                "--output_path",
                "/run/O2T_RESULTS",
                "--merge_all_samples",
            ]
        );
    }

    #[test]
    fn tree_inference_uses_alignment_as_prefix() {
        let invocation = TreeInferenceInvocation {
            threads: 8,
            alignment: PathBuf::from("/run/concat_merge_aa.phy"),
            bootstrap: 1000,
        }
        .invocation(&tools());

        assert_eq!(
            invocation.args(),
            [
                "-T",
                "8",
                "-s",
                "/run/concat_merge_aa.phy",
                "--prefix",
                "/run/concat_merge_aa.phy",
                "-B",
                "1000",
            ]
        );
    }

    #[test]
    fn zero_bootstrap_omits_the_flag() {
        let invocation = TreeInferenceInvocation {
            threads: 4,
            alignment: PathBuf::from("/a.phy"),
            bootstrap: 0,
        }
        .invocation(&tools());

        assert!(!invocation.args().iter().any(|a| a == "-B"));
    }

    #[test]
    fn position_table_appends_optional_arguments_last() {
        let base = PositionTableInvocation {
            scripts_dir: PathBuf::from("/opt/scripts"),
            msa_dir: PathBuf::from("/run/O2T_RESULTS/MSA/AA"),
            og_table: PathBuf::from("/run/og_gene_table.csv"),
            output: PathBuf::from("/run/statistics/entropy/positions_aa.csv"),
            seq_type: SeqType::Aa,
            metadata: PathBuf::from("/run/metadata.csv"),
            five_letter: PathBuf::from("/run/five_letter_taxon.tsv"),
            exclude_pattern: None,
            filter: None,
        };

        let plain = base.invocation(&tools());
        assert_eq!(plain.args()[0], "/opt/scripts/msa_to_position_table.py");
        assert!(!plain.args().iter().any(|a| a == "--exclude_pattern"));
        assert!(plain.args().iter().any(|a| a == "AA"));

        let full = PositionTableInvocation {
            exclude_pattern: Some("^s0".to_string()),
            filter: Some(("genotype".to_string(), "GT1".to_string())),
            ..base
        }
        .invocation(&tools());
        let args = full.args();
        let tail = &args[args.len() - 6..];
        assert_eq!(
            tail,
            [
                "--exclude_pattern",
                "^s0",
                "--filter_column",
                "genotype",
                "--filter_value",
                "GT1",
            ]
        );
    }

    #[test]
    fn entropy_options_are_conditional() {
        let base = EntropyInvocation {
            scripts_dir: PathBuf::from("/opt/scripts"),
            positions: PathBuf::from("/p.csv"),
            output: PathBuf::from("/e.csv"),
            metadata: PathBuf::from("/m.csv"),
            group_by: None,
            min_samples: None,
            exclude_gaps: false,
        };
        assert!(!base
            .invocation(&tools())
            .args()
            .iter()
            .any(|a| a.starts_with("--group_by") || a == "--exclude_gaps"));

        let full = EntropyInvocation {
            group_by: Some(vec!["genotype".to_string(), "region".to_string()]),
            min_samples: Some(5),
            exclude_gaps: true,
            ..base
        }
        .invocation(&tools());
        let args = full.args();
        assert!(args.windows(2).any(|w| w == ["--group_by", "genotype,region"]));
        assert!(args.windows(2).any(|w| w == ["--min_samples", "5"]));
        assert_eq!(args.last().map(String::as_str), Some("--exclude_gaps"));
    }

    #[test]
    fn tree_view_points_at_the_shipped_template() {
        let invocation = TreeViewInvocation {
            scripts_dir: PathBuf::from("/opt/scripts"),
            tree: PathBuf::from("/t.nwk"),
            metadata: PathBuf::from("/m.csv"),
            label: "o2t_view".to_string(),
            output_prefix: PathBuf::from("/run/visualization/o2t_view"),
        }
        .invocation(&tools());

        assert!(invocation
            .args()
            .iter()
            .any(|a| a == "/opt/scripts/tree_view_template.html"));
    }
}
