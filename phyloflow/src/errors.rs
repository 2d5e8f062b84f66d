//! Error types for the phyloflow pipeline driver.
//!
//! The taxonomy mirrors the failure classes of the run: configuration,
//! missing dependencies, missing or empty artifacts, cross-validation
//! failures, external tool failures and post-condition failures. Every
//! variant carries the specific path, value or identifier list involved so
//! the operator never sees a bare "validation failed".

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for a pipeline run.
#[derive(Debug, Error)]
pub enum PhyloflowError {
    /// Configuration is malformed or mutually inconsistent.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A required external tool, script or library is absent.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// A required file or directory is absent or empty.
    #[error("{0}")]
    Artifact(#[from] ArtifactError),

    /// An auxiliary input failed cross-validation against reference data.
    #[error("{0}")]
    CrossValidation(#[from] CheckError),

    /// An external collaborator exited with a non-zero status.
    #[error("{tool} exited with status {status}")]
    ToolFailure {
        /// Name of the failing tool.
        tool: String,
        /// The child's exit status (-1 when killed by a signal).
        status: i32,
    },

    /// A produced artifact exists but holds no usable data.
    #[error("{0}")]
    PostCondition(String),

    /// The run was interrupted from the outside.
    #[error("run interrupted")]
    Interrupted,

    /// A sequencing bug: a stage ran without its required inputs.
    #[error("internal error: {0}")]
    Internal(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building the run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Thread count must be positive.
    #[error("thread count must be at least 1 (got {0})")]
    InvalidThreads(usize),

    /// Bootstrap replicates are constrained by the tree inference tool.
    #[error("bootstrap count must be 0 or at least 1000 (got {0})")]
    InvalidBootstrap(u32),

    /// `--filter-column` and `--filter-value` only make sense together.
    #[error("--filter-column and --filter-value must be given together")]
    IncompleteFilter,

    /// An unknown sequence-type token was supplied.
    #[error("unknown sequence type '{0}' (expected 'aa' or 'dna')")]
    UnknownSeqType(String),

    /// The exclusion pattern is not a valid regular expression.
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern {
        /// The rejected pattern.
        pattern: String,
        /// Why the regex engine rejected it.
        reason: String,
    },

    /// A group-by column list was supplied but contained no usable names.
    #[error("--group-by was given but contains no column names")]
    EmptyGroupBy,
}

/// Errors raised while locating required files and directories.
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    /// A required file is missing.
    #[error("required file not found: {0}")]
    FileMissing(PathBuf),

    /// A required file exists but is empty.
    #[error("required file is empty: {0}")]
    FileEmpty(PathBuf),

    /// A required directory is missing.
    #[error("required directory not found: {0}")]
    DirMissing(PathBuf),

    /// A required directory exists but holds no entries.
    #[error("required directory is empty: {0}")]
    DirEmpty(PathBuf),

    /// No candidate matched the discovery pattern in any searched location.
    #[error("no file matching '{pattern}' found under {}", join_paths(.searched))]
    NoCandidate {
        /// The discovery pattern that produced no match.
        pattern: String,
        /// Every directory that was searched, in order.
        searched: Vec<PathBuf>,
    },

    /// Neither the primary nor the fallback artifact is usable.
    #[error("tree file not found: neither {primary} nor fallback {fallback} exists and is non-empty")]
    NoTreeFile {
        /// The preferred artifact path.
        primary: PathBuf,
        /// The secondary artifact path.
        fallback: PathBuf,
    },
}

/// Errors raised by the cross-validation checks.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    /// The reference table could not be parsed.
    #[error("reference gene table {path}: {reason}")]
    ReferenceTable {
        /// Path of the table.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The domain annotation table could not be read or parsed.
    #[error("domain table {path}: {reason}")]
    DomainUnreadable {
        /// Path of the table.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The domain annotation table misses required columns.
    #[error("domain table {path} is missing required column(s): {}", .missing.join(", "))]
    DomainColumnsMissing {
        /// Path of the table.
        path: PathBuf,
        /// Canonical lowercase names of the absent columns.
        missing: Vec<String>,
    },

    /// The domain annotation table holds no data rows.
    #[error("domain table {0} contains no data rows")]
    DomainTableEmpty(PathBuf),

    /// One or more domain rows failed coordinate validation.
    #[error("domain table {path} has {} invalid row(s):\n{}", .rows.len(), .rows.join("\n"))]
    DomainInvalidRows {
        /// Path of the table.
        path: PathBuf,
        /// One description per offending row.
        rows: Vec<String>,
    },

    /// Domain rows reference genes absent from the reference table.
    #[error("domain table {path} references unknown gene(s): {}", .genes.join(", "))]
    DomainUnknownGenes {
        /// Path of the table.
        path: PathBuf,
        /// Every offending gene value, sorted.
        genes: Vec<String>,
    },

    /// The alignment directory holds no recognizable alignment files.
    #[error("no OG*.fa alignments found in {0}")]
    NoAlignments(PathBuf),

    /// Aligned identifiers are absent from the reference table.
    #[error("alignment identifier(s) missing from the reference gene table: {}", .ids.join(", "))]
    UnknownAlignmentIds {
        /// Every offending identifier, sorted.
        ids: Vec<String>,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_names_tool_and_status() {
        let err = PhyloflowError::ToolFailure {
            tool: "iqtree2".to_string(),
            status: 2,
        };
        assert_eq!(err.to_string(), "iqtree2 exited with status 2");
    }

    #[test]
    fn no_candidate_lists_searched_dirs() {
        let err = ArtifactError::NoCandidate {
            pattern: "concat_*_aa.phy".to_string(),
            searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };
        let msg = err.to_string();
        assert!(msg.contains("concat_*_aa.phy"));
        assert!(msg.contains("/a, /b"));
    }

    #[test]
    fn unknown_genes_are_listed() {
        let err = CheckError::DomainUnknownGenes {
            path: PathBuf::from("domains.csv"),
            genes: vec!["E1".to_string(), "NS5B".to_string()],
        };
        assert!(err.to_string().contains("E1, NS5B"));
    }
}
