//! External command invocation.
//!
//! Every collaborator runs through [`ToolInvocation`]: the fully-quoted
//! command line is logged before execution for reproducibility, and the
//! child's exit status is mirrored into a typed error, never masked.

mod builders;

pub use builders::{
    CombineInvocation, EntropyInvocation, MetadataPrepInvocation, MetadataValidateInvocation,
    PlotInvocation, PositionTableInvocation, TreeInferenceInvocation, TreeViewInvocation,
    helper_scripts, ENTROPY_SCRIPT, PLOT_SCRIPT, POSITION_TABLE_SCRIPT, PREPARE_VIEW_SCRIPT,
    TREE_VIEW_SCRIPT, TREE_VIEW_TEMPLATE, VALIDATE_METADATA_SCRIPT,
};

use crate::errors::PhyloflowError;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// One external command, ready to launch.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    label: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ToolInvocation {
    /// Creates an invocation of `program`, labelled for diagnostics.
    #[must_use]
    pub fn new(label: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().to_string_lossy().into_owned())
    }

    /// The diagnostic label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The argument list, in invocation order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The fully-quoted command line as logged before execution.
    #[must_use]
    pub fn rendered(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(shell_quote(&self.program.to_string_lossy()).into_owned());
        parts.extend(self.args.iter().map(|a| shell_quote(a).into_owned()));
        parts.join(" ")
    }

    /// Launches the command and waits for it synchronously.
    ///
    /// # Errors
    ///
    /// [`PhyloflowError::MissingDependency`] when the program cannot be
    /// launched, [`PhyloflowError::ToolFailure`] mirroring any non-zero
    /// child exit status.
    pub async fn run(&self) -> Result<(), PhyloflowError> {
        info!("exec: {}", self.rendered());
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|e| {
                PhyloflowError::MissingDependency(format!(
                    "failed to launch {}: {e}",
                    self.program.display()
                ))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PhyloflowError::ToolFailure {
                tool: self.label.clone(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Quotes a token for the audit log so the line can be replayed in a shell.
fn shell_quote(token: &str) -> Cow<'_, str> {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=+:,@%".contains(c));
    if safe {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', r"'\''")))
    }
}
