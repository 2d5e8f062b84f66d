//! Stage sequencing.
//!
//! The sequencer validates the run, performs preflight checks, then executes
//! the fixed stage order strictly sequentially. Any stage failure aborts the
//! run; the working directory is released on every exit path.

pub mod stages;

#[cfg(all(test, unix))]
mod integration_tests;

use crate::checks::{validate_domain_table, ReferenceTable};
use crate::config::RunConfig;
use crate::errors::PhyloflowError;
use crate::layout::RootLayout;
use crate::preflight::run_preflight;
use crate::workdir::WorkDir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Lifecycle states of a run.
///
/// `Done` and `Failed` are terminal; every other state can transition to
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing has happened yet.
    Init,
    /// Configuration and early cross-validation.
    Validating,
    /// Dependency and input checks.
    Preflight,
    /// Stages are executing.
    Running,
    /// The run completed successfully.
    Done,
    /// The run aborted.
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Validating => "validating",
            Self::Preflight => "preflight",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Execution status of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Stage completed.
    Ok,
    /// Stage failed; the run aborts.
    Fail,
}

/// What a successful stage hands back to the sequencer.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    /// Artifacts produced by the stage.
    pub artifacts: Vec<PathBuf>,
    /// One-line human-readable summary.
    pub summary: String,
}

impl StageOutput {
    /// Creates an output with a summary and no artifacts.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            artifacts: Vec::new(),
            summary: summary.into(),
        }
    }

    /// Records a produced artifact.
    #[must_use]
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }
}

/// Report for one executed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage name.
    pub name: String,
    /// Final status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Artifacts produced by the stage.
    pub artifacts: Vec<PathBuf>,
    /// One-line summary.
    pub summary: String,
    /// Error message when the stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageReport {
    /// Builds the report for a completed stage.
    #[must_use]
    pub fn completed(name: &str, started_at: DateTime<Utc>, output: StageOutput) -> Self {
        Self {
            name: name.to_string(),
            status: StageStatus::Ok,
            started_at,
            ended_at: Utc::now(),
            artifacts: output.artifacts,
            summary: output.summary,
            error: None,
        }
    }

    /// Builds the report for a failed stage.
    #[must_use]
    pub fn failed(name: &str, started_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StageStatus::Fail,
            started_at,
            ended_at: Utc::now(),
            artifacts: Vec::new(),
            summary: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Final outcome of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// Terminal state.
    pub state: RunState,
    /// Per-stage reports, in execution order.
    pub stages: Vec<StageReport>,
}

/// Mutable state threaded through the stages.
pub struct RunContext {
    /// The validated configuration.
    pub config: Arc<RunConfig>,
    /// Derived filesystem layout.
    pub layout: RootLayout,
    /// Transient working directory path.
    pub workdir: PathBuf,
    /// Reference table loaded during validation.
    pub reference: ReferenceTable,
    alignment: Option<PathBuf>,
    tree: Option<PathBuf>,
    positions: Option<PathBuf>,
    entropy: Option<PathBuf>,
}

impl RunContext {
    fn require<'a>(slot: Option<&'a PathBuf>, what: &str) -> Result<&'a Path, PhyloflowError> {
        slot.map(PathBuf::as_path)
            .ok_or_else(|| PhyloflowError::Internal(format!("{what} not resolved yet")))
    }

    /// Records the resolved concatenated alignment.
    pub fn set_alignment(&mut self, path: PathBuf) {
        self.alignment = Some(path);
    }

    /// The concatenated alignment resolved after the combine stage.
    ///
    /// # Errors
    ///
    /// When called before the combine stage resolved it.
    pub fn alignment(&self) -> Result<&Path, PhyloflowError> {
        Self::require(self.alignment.as_ref(), "concatenated alignment")
    }

    /// Records the resolved tree file.
    pub fn set_tree(&mut self, path: PathBuf) {
        self.tree = Some(path);
    }

    /// The tree resolved after the inference stage.
    ///
    /// # Errors
    ///
    /// When called before the inference stage resolved it.
    pub fn tree(&self) -> Result<&Path, PhyloflowError> {
        Self::require(self.tree.as_ref(), "tree file")
    }

    /// Records the produced position table.
    pub fn set_positions(&mut self, path: PathBuf) {
        self.positions = Some(path);
    }

    /// The position table produced by the extraction stage.
    ///
    /// # Errors
    ///
    /// When called before the extraction stage produced it.
    pub fn positions(&self) -> Result<&Path, PhyloflowError> {
        Self::require(self.positions.as_ref(), "position table")
    }

    /// Records the produced entropy table.
    pub fn set_entropy(&mut self, path: PathBuf) {
        self.entropy = Some(path);
    }

    /// The entropy table produced by the entropy stage.
    ///
    /// # Errors
    ///
    /// When called before the entropy stage produced it.
    pub fn entropy(&self) -> Result<&Path, PhyloflowError> {
        Self::require(self.entropy.as_ref(), "entropy table")
    }
}

/// One ordered step of the pipeline, backed by one or more external tool
/// invocations.
#[async_trait::async_trait]
pub trait Stage: Send + Sync {
    /// The stage's name, used in logs and reports.
    fn name(&self) -> &'static str;

    /// Executes the stage.
    async fn execute(&self, ctx: &mut RunContext) -> Result<StageOutput, PhyloflowError>;
}

/// Drives one run through the fixed stage order.
pub struct StageSequencer {
    config: Arc<RunConfig>,
}

impl StageSequencer {
    /// Creates a sequencer for the given configuration.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    ///
    /// The first failing check or stage aborts the run. The working
    /// directory is released (or retained in debug mode) on every path.
    pub async fn run(&self) -> Result<RunOutcome, PhyloflowError> {
        let run_id = Uuid::new_v4();
        info!("run {run_id} starting");

        let mut state = RunState::Init;
        let mut reports = Vec::new();

        match self.drive(&mut state, &mut reports).await {
            Ok(()) => {
                transition(&mut state, RunState::Done);
                let outcome = RunOutcome {
                    run_id,
                    state,
                    stages: reports,
                };
                self.write_report(&outcome)?;
                info!("run {run_id} finished");
                Ok(outcome)
            }
            Err(e) => {
                let from = state;
                state = RunState::Failed;
                error!("run {run_id} failed during {from}: {e}");
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        state: &mut RunState,
        reports: &mut Vec<StageReport>,
    ) -> Result<(), PhyloflowError> {
        let config = Arc::clone(&self.config);
        let layout = RootLayout::new(&config.output_root, config.seq_type);

        transition(state, RunState::Validating);
        info!(
            "configuration: root={} seq_type={} threads={} bootstrap={} label={}",
            config.output_root.display(),
            config.seq_type,
            config.threads,
            config.bootstrap,
            config.label
        );

        // The working directory brackets the rest of the run.
        let workdir = WorkDir::acquire(&config)?;

        transition(state, RunState::Preflight);
        run_preflight(&config, &layout).await?;

        // Early cross-validation, before any expensive stage.
        let reference = ReferenceTable::load(&layout.og_gene_table())?;
        if let Some(ref domain_table) = config.domain_table {
            validate_domain_table(domain_table, &reference)?;
        }

        transition(state, RunState::Running);
        let mut ctx = RunContext {
            config: Arc::clone(&config),
            layout,
            workdir: workdir.path().to_path_buf(),
            reference,
            alignment: None,
            tree: None,
            positions: None,
            entropy: None,
        };

        let stages = stages::default_stages();
        let total = stages.len();
        for (index, stage) in stages.iter().enumerate() {
            info!("stage {}/{total}: {}", index + 1, stage.name());
            let started = Utc::now();
            match stage.execute(&mut ctx).await {
                Ok(output) => {
                    info!("stage {} done: {}", stage.name(), output.summary);
                    reports.push(StageReport::completed(stage.name(), started, output));
                }
                Err(e) => {
                    reports.push(StageReport::failed(stage.name(), started, e.to_string()));
                    return Err(e);
                }
            }
        }

        drop(workdir);
        Ok(())
    }

    fn write_report(&self, outcome: &RunOutcome) -> Result<(), PhyloflowError> {
        let layout = RootLayout::new(&self.config.output_root, self.config.seq_type);
        let path = layout.run_report();
        std::fs::create_dir_all(layout.statistics_dir())?;
        let json = serde_json::to_string_pretty(outcome)
            .map_err(|e| PhyloflowError::Internal(format!("report serialization: {e}")))?;
        std::fs::write(&path, json)?;
        info!("run report written to {}", path.display());
        Ok(())
    }
}

fn transition(state: &mut RunState, next: RunState) {
    info!("state: {state} -> {next}");
    *state = next;
}
