//! The fixed stage order of the pipeline.
//!
//! Every stage wraps one or two external invocations, resolves the artifacts
//! the next stage needs, and reports what it produced.

use super::{RunContext, Stage, StageOutput};
use crate::artifacts::{require_file, resolve_concatenated_alignment, resolve_tree_file};
use crate::checks::cross_check_gene_ids;
use crate::errors::PhyloflowError;
use crate::layout::RootLayout;
use crate::tools::{
    CombineInvocation, EntropyInvocation, MetadataPrepInvocation, PlotInvocation,
    PositionTableInvocation, TreeInferenceInvocation, TreeViewInvocation,
};
use std::fs;
use std::path::{Path, PathBuf};

/// The stages in execution order.
#[must_use]
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(CombineStage),
        Box::new(TreeInferenceStage),
        Box::new(VisualizationStage),
        Box::new(PositionTableStage),
        Box::new(EntropyStage),
        Box::new(PlotStage),
    ]
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Merges per-sample marker genes into the concatenated alignment.
pub struct CombineStage;

#[async_trait::async_trait]
impl Stage for CombineStage {
    fn name(&self) -> &'static str {
        "combine"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError> {
        CombineInvocation {
            marker_genes: ctx.layout.marker_genes_dir(),
            dna_reference: ctx.layout.dna_reference(),
            output_path: ctx.layout.results_dir(),
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        let alignment = resolve_concatenated_alignment(&ctx.layout)?;
        let summary = format!("concatenated alignment at {}", alignment.display());
        ctx.set_alignment(alignment.clone());
        Ok(StageOutput::new(summary).with_artifact(alignment))
    }
}

/// Infers the tree over the concatenated alignment.
pub struct TreeInferenceStage;

#[async_trait::async_trait]
impl Stage for TreeInferenceStage {
    fn name(&self) -> &'static str {
        "tree-inference"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError> {
        let alignment = ctx.alignment()?.to_path_buf();

        TreeInferenceInvocation {
            threads: ctx.config.threads,
            alignment: alignment.clone(),
            bootstrap: ctx.config.bootstrap,
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        // The alignment path doubles as the output prefix; the consensus
        // tree stands in when the main tree is absent.
        let primary = with_suffix(&alignment, ".treefile");
        let fallback = with_suffix(&alignment, ".contree");
        let tree = resolve_tree_file(&primary, &fallback)?;

        let summary = format!("tree at {}", tree.display());
        ctx.set_tree(tree.clone());
        Ok(StageOutput::new(summary).with_artifact(tree))
    }
}

/// Relabels the tree and renders the interactive view.
pub struct VisualizationStage;

#[async_trait::async_trait]
impl Stage for VisualizationStage {
    fn name(&self) -> &'static str {
        "visualization"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError> {
        let tree = ctx.tree()?.to_path_buf();
        let viz_dir = ctx.layout.visualization_dir();
        fs::create_dir_all(&viz_dir)?;

        let relabeled = RootLayout::relabeled_tree(&tree);
        let view_metadata = ctx.layout.view_metadata();

        MetadataPrepInvocation {
            scripts_dir: ctx.config.scripts_dir.clone(),
            metadata: ctx.config.metadata.clone(),
            five_letter: ctx.layout.five_letter_file(),
            input_tree: tree,
            output_tree: relabeled.clone(),
            output_metadata: view_metadata.clone(),
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        TreeViewInvocation {
            scripts_dir: ctx.config.scripts_dir.clone(),
            tree: relabeled.clone(),
            metadata: view_metadata.clone(),
            label: ctx.config.label.clone(),
            output_prefix: viz_dir.join(&ctx.config.label),
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        let summary = format!("view rendered under {}", viz_dir.display());
        Ok(StageOutput::new(summary)
            .with_artifact(relabeled)
            .with_artifact(view_metadata))
    }
}

/// Extracts the per-position table from the per-OG alignments.
pub struct PositionTableStage;

#[async_trait::async_trait]
impl Stage for PositionTableStage {
    fn name(&self) -> &'static str {
        "position-table"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError> {
        // Identifier mismatches must surface here, not as an opaque script
        // failure halfway through extraction.
        let report = cross_check_gene_ids(&ctx.layout.msa_dir(), &ctx.reference)?;

        fs::create_dir_all(ctx.layout.entropy_dir())?;
        let output = ctx.layout.positions_table();

        PositionTableInvocation {
            scripts_dir: ctx.config.scripts_dir.clone(),
            msa_dir: ctx.layout.msa_dir(),
            og_table: ctx.layout.og_gene_table(),
            output: output.clone(),
            seq_type: ctx.config.seq_type,
            metadata: ctx.config.metadata.clone(),
            five_letter: ctx.layout.five_letter_file(),
            exclude_pattern: ctx.config.exclude_pattern.clone(),
            filter: ctx.config.filter.clone(),
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        let summary = format!("positions for {} alignment(s)", report.aligned.len());
        ctx.set_positions(output.clone());
        Ok(StageOutput::new(summary).with_artifact(output))
    }
}

/// Computes per-position entropy from the position table.
pub struct EntropyStage;

#[async_trait::async_trait]
impl Stage for EntropyStage {
    fn name(&self) -> &'static str {
        "entropy"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError> {
        let positions = ctx.positions()?.to_path_buf();
        let output = ctx.layout.entropy_table();

        EntropyInvocation {
            scripts_dir: ctx.config.scripts_dir.clone(),
            positions,
            output: output.clone(),
            metadata: ctx.config.metadata.clone(),
            group_by: ctx.config.group_by.clone(),
            min_samples: ctx.config.min_samples,
            exclude_gaps: ctx.config.exclude_gaps,
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        require_file(&output)?;
        let rows = ensure_data_rows(&output)?;

        let summary = format!("{rows} entropy row(s) in {}", output.display());
        ctx.set_entropy(output.clone());
        Ok(StageOutput::new(summary).with_artifact(output))
    }
}

/// Requires at least one data row beyond the header line.
fn ensure_data_rows(table: &Path) -> Result<usize, PhyloflowError> {
    let contents = fs::read_to_string(table)?;
    let rows = contents
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .count();
    if rows == 0 {
        return Err(PhyloflowError::PostCondition(format!(
            "entropy table {} has a header but no data rows; relax --filter-value/--exclude-pattern \
             or lower --min-samples",
            table.display()
        )));
    }
    Ok(rows)
}

/// Plots the entropy table.
pub struct PlotStage;

#[async_trait::async_trait]
impl Stage for PlotStage {
    fn name(&self) -> &'static str {
        "plot"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError> {
        let entropy = ctx.entropy()?.to_path_buf();
        let output_dir = ctx.layout.entropy_dir();

        PlotInvocation {
            scripts_dir: ctx.config.scripts_dir.clone(),
            entropy,
            output_dir: output_dir.clone(),
            seq_type: ctx.config.seq_type,
        }
        .invocation(&ctx.config.tools)
        .run()
        .await?;

        Ok(StageOutput::new(format!("plots written to {}", output_dir.display())))
    }
}
