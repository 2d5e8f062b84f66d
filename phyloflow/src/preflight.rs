//! Preflight checks: everything that can fail cheaply must fail before the
//! first expensive stage starts.

use crate::artifacts::{require_dir, require_file};
use crate::config::RunConfig;
use crate::errors::PhyloflowError;
use crate::layout::RootLayout;
use crate::tools::{helper_scripts, MetadataValidateInvocation, ToolInvocation};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Python modules the helper scripts import.
const PYTHON_MODULES: [&str; 2] = ["Bio", "pandas"];

/// Resolves `program` to an existing file.
///
/// Bare names are searched on `PATH`; anything with a path separator is
/// checked as given.
///
/// # Errors
///
/// [`PhyloflowError::MissingDependency`] naming the program.
pub fn locate_program(program: &Path) -> Result<PathBuf, PhyloflowError> {
    if program.components().count() > 1 {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(PhyloflowError::MissingDependency(format!(
            "{} does not exist",
            program.display()
        )));
    }

    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| candidate.is_file())
        })
        .ok_or_else(|| {
            PhyloflowError::MissingDependency(format!(
                "{} not found on PATH",
                program.display()
            ))
        })
}

async fn check_python_import(python: &Path, module: &str) -> Result<(), PhyloflowError> {
    ToolInvocation::new(format!("python import check ({module})"), python)
        .arg("-c")
        .arg(format!("import {module}"))
        .run()
        .await
        .map_err(|_| {
            PhyloflowError::MissingDependency(format!(
                "python module '{module}' is not importable"
            ))
        })
}

/// Runs every precondition check, then the external metadata validator.
///
/// # Errors
///
/// The first failing check aborts with the specific path, program or module
/// involved.
pub async fn run_preflight(config: &RunConfig, layout: &RootLayout) -> Result<(), PhyloflowError> {
    // Prior-stage files and directories.
    require_dir(&layout.results_dir())?;
    require_dir(&layout.marker_genes_dir())?;
    require_dir(&layout.msa_dir())?;
    require_file(&layout.dna_reference())?;
    require_file(&layout.five_letter_file())?;
    require_file(&layout.og_gene_table())?;
    require_file(&config.metadata)?;
    debug!("prior-stage inputs present under {}", layout.root().display());

    // External tools.
    for program in [&config.tools.read2tree, &config.tools.iqtree, &config.tools.python] {
        let resolved = locate_program(program)?;
        debug!("found {} at {}", program.display(), resolved.display());
    }

    // Helper scripts shipped with the tool.
    for name in helper_scripts() {
        let path = config.scripts_dir.join(name);
        if !path.is_file() {
            return Err(PhyloflowError::MissingDependency(format!(
                "helper script {} is missing",
                path.display()
            )));
        }
    }

    // Libraries the helper scripts import.
    for module in PYTHON_MODULES {
        check_python_import(&config.tools.python, module).await?;
    }

    // Cheap metadata validation before any expensive stage.
    MetadataValidateInvocation {
        scripts_dir: config.scripts_dir.clone(),
        metadata: config.metadata.clone(),
        five_letter: layout.five_letter_file(),
        results_dir: layout.results_dir(),
    }
    .invocation(&config.tools)
    .run()
    .await?;

    info!("preflight checks passed");
    Ok(())
}
