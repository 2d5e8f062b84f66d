//! phyloflow CLI
//!
//! Command-line entry point for the pipeline stage driver.

use anyhow::Result;
use clap::Parser;
use phyloflow::config::{RunConfig, SeqType, DEFAULT_BOOTSTRAP, DEFAULT_LABEL, DEFAULT_THREADS};
use phyloflow::errors::PhyloflowError;
use phyloflow::pipeline::StageSequencer;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "phyloflow")]
#[command(author, version, about = "Entropy and visualization stage of the Omni2Tree pipeline")]
#[command(
    long_about = "Run the combine, tree inference, visualization, position-table, entropy and \
plotting stages over a prior Omni2Tree stage's output directory.

Examples:
  phyloflow --output-root runs/hepc --metadata metadata.csv
  phyloflow --output-root runs/hepc --metadata metadata.csv --seq-type dna --threads 16
  phyloflow --output-root runs/hepc --metadata metadata.csv \
            --filter-column genotype --filter-value GT1 --min-samples 5"
)]
struct Cli {
    /// Output root containing the prior stage's results
    #[arg(long, value_name = "DIR")]
    output_root: PathBuf,

    /// Sample metadata CSV
    #[arg(long, value_name = "FILE")]
    metadata: PathBuf,

    /// Sequence type: aa or dna
    #[arg(long, default_value = "aa", value_name = "TYPE")]
    seq_type: String,

    /// Threads handed to the tree inference tool
    #[arg(long, default_value_t = DEFAULT_THREADS, value_name = "N")]
    threads: usize,

    /// Bootstrap replicates (0 disables, otherwise at least 1000)
    #[arg(long, default_value_t = DEFAULT_BOOTSTRAP, value_name = "N")]
    bootstrap: u32,

    /// Override the transient working directory
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Verbose logging; retain the working directory
    #[arg(long)]
    debug: bool,

    /// Label used for visualization outputs
    #[arg(long, default_value = DEFAULT_LABEL, value_name = "LABEL")]
    label: String,

    /// Exclude sample ids matching this pattern from extraction
    #[arg(long, value_name = "REGEX")]
    exclude_pattern: Option<String>,

    /// Metadata column to filter on (requires --filter-value)
    #[arg(long, value_name = "COLUMN")]
    filter_column: Option<String>,

    /// Metadata value to keep (requires --filter-column)
    #[arg(long, value_name = "VALUE")]
    filter_value: Option<String>,

    /// Comma-separated metadata columns to group entropy by
    #[arg(long, value_delimiter = ',', value_name = "COLS")]
    group_by: Option<Vec<String>>,

    /// Minimum samples per group in the entropy computation
    #[arg(long, value_name = "N")]
    min_samples: Option<u32>,

    /// Drop gap characters in the entropy computation
    #[arg(long)]
    exclude_gaps: bool,

    /// Domain annotation table (gene,domain,start,end)
    #[arg(long, value_name = "FILE")]
    domain_table: Option<PathBuf>,

    /// Directory holding the helper scripts
    #[arg(long, value_name = "DIR")]
    scripts_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let seq_type: SeqType = self.seq_type.parse()?;
        let mut builder = RunConfig::builder(self.output_root, self.metadata)
            .with_seq_type(seq_type)
            .with_threads(self.threads)
            .with_bootstrap(self.bootstrap)
            .with_debug(self.debug)
            .with_label(self.label)
            .with_exclude_gaps(self.exclude_gaps);

        if let Some(workdir) = self.workdir {
            builder = builder.with_workdir(workdir);
        }
        if let Some(pattern) = self.exclude_pattern {
            builder = builder.with_exclude_pattern(pattern);
        }
        if let Some(column) = self.filter_column {
            builder = builder.with_filter_column(column);
        }
        if let Some(value) = self.filter_value {
            builder = builder.with_filter_value(value);
        }
        if let Some(columns) = self.group_by {
            builder = builder.with_group_by(columns);
        }
        if let Some(min_samples) = self.min_samples {
            builder = builder.with_min_samples(min_samples);
        }
        if let Some(table) = self.domain_table {
            builder = builder.with_domain_table(table);
        }
        if let Some(dir) = self.scripts_dir {
            builder = builder.with_scripts_dir(dir);
        }

        Ok(builder.build()?)
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let sequencer = StageSequencer::new(config);

    tokio::select! {
        outcome = sequencer.run() => {
            outcome?;
            Ok(())
        }
        // Dropping the run future releases the working directory.
        _ = tokio::signal::ctrl_c() => Err(PhyloflowError::Interrupted.into()),
    }
}

/// A failing collaborator's exit status becomes this process's exit status.
fn exit_code_for(e: &anyhow::Error) -> ExitCode {
    match e.downcast_ref::<PhyloflowError>() {
        Some(&PhyloflowError::ToolFailure { status, .. }) if (1..=255).contains(&status) => {
            ExitCode::from(u8::try_from(status).unwrap_or(1))
        }
        _ => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            exit_code_for(&e)
        }
    }
}
