//! # Phyloflow
//!
//! Driver for one stage of an Omni2Tree/Read2Tree phylogenomic pipeline:
//! combine per-sample marker genes, infer a tree, prepare the visualization,
//! and compute per-position entropy tables.
//!
//! Phyloflow implements no bioinformatics algorithm itself. It validates
//! preconditions, sequences the external tools in a fixed order, resolves
//! ambiguous or missing intermediate artifacts via documented fallback
//! rules, and fails fast with the specific path, value or identifier
//! involved when anything is off.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phyloflow::prelude::*;
//!
//! let config = RunConfig::builder("/data/run42", "/data/metadata.csv")
//!     .with_seq_type(SeqType::Dna)
//!     .with_threads(8)
//!     .build()?;
//!
//! let outcome = StageSequencer::new(config).run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifacts;
pub mod checks;
pub mod config;
pub mod errors;
pub mod labels;
pub mod layout;
pub mod pipeline;
pub mod preflight;
pub mod tools;
pub mod workdir;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifacts::{resolve_concatenated_alignment, resolve_tree_file};
    pub use crate::checks::{cross_check_gene_ids, validate_domain_table, ReferenceTable};
    pub use crate::config::{RunConfig, RunConfigBuilder, SeqType, ToolPaths};
    pub use crate::errors::{
        ArtifactError, CheckError, ConfigError, PhyloflowError,
    };
    pub use crate::labels::{clean_alnum, sanitize_label};
    pub use crate::layout::RootLayout;
    pub use crate::pipeline::{
        RunOutcome, RunState, Stage, StageOutput, StageReport, StageSequencer, StageStatus,
    };
    pub use crate::tools::ToolInvocation;
    pub use crate::workdir::WorkDir;
}
