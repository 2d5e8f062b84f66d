//! Run configuration: built once from user input, validated before any
//! external process starts, never mutated afterwards.

use crate::errors::ConfigError;
use crate::labels::sanitize_label;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default number of threads handed to the tree inference tool.
pub const DEFAULT_THREADS: usize = 4;

/// Default bootstrap replicate count.
pub const DEFAULT_BOOTSTRAP: u32 = 1000;

/// Default label used for visualization outputs.
pub const DEFAULT_LABEL: &str = "o2t_view";

/// Sequence-type mode of the run.
///
/// Each mode carries a lowercase token (file naming) and an uppercase token
/// (collaborator arguments and MSA directory naming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeqType {
    /// Amino acid alignments.
    Aa,
    /// Nucleotide alignments.
    Dna,
}

impl SeqType {
    /// Lowercase token, e.g. for output file names.
    #[must_use]
    pub const fn lowercase(self) -> &'static str {
        match self {
            Self::Aa => "aa",
            Self::Dna => "dna",
        }
    }

    /// Uppercase token, e.g. for collaborator `--seq_type` arguments.
    #[must_use]
    pub const fn uppercase(self) -> &'static str {
        match self {
            Self::Aa => "AA",
            Self::Dna => "DNA",
        }
    }
}

impl FromStr for SeqType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aa" => Ok(Self::Aa),
            "dna" => Ok(Self::Dna),
            other => Err(ConfigError::UnknownSeqType(other.to_string())),
        }
    }
}

impl std::fmt::Display for SeqType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.lowercase())
    }
}

/// Programs the run shells out to.
///
/// Bare names are resolved against `PATH` during preflight; tests substitute
/// absolute paths to stub executables.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// The combine tool.
    pub read2tree: PathBuf,
    /// The tree inference tool.
    pub iqtree: PathBuf,
    /// The interpreter running the helper scripts.
    pub python: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            read2tree: PathBuf::from("read2tree"),
            iqtree: PathBuf::from("iqtree2"),
            python: PathBuf::from("python3"),
        }
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory holding the prior stage's outputs.
    pub output_root: PathBuf,
    /// Sample metadata CSV.
    pub metadata: PathBuf,
    /// Sequence-type mode.
    pub seq_type: SeqType,
    /// Thread count passed through to the tree inference tool.
    pub threads: usize,
    /// Bootstrap replicates: 0 (disabled) or >= 1000.
    pub bootstrap: u32,
    /// Optional override for the transient working directory.
    pub workdir_override: Option<PathBuf>,
    /// Debug mode: verbose logging and working-directory retention.
    pub debug: bool,
    /// Optional sample-id exclusion pattern.
    pub exclude_pattern: Option<String>,
    /// Optional metadata (column, value) filter; both or neither.
    pub filter: Option<(String, String)>,
    /// Optional group-by column list for the entropy computation.
    pub group_by: Option<Vec<String>>,
    /// Optional minimum-sample threshold for the entropy computation.
    pub min_samples: Option<u32>,
    /// Drop gap characters in the entropy computation.
    pub exclude_gaps: bool,
    /// Optional domain annotation table.
    pub domain_table: Option<PathBuf>,
    /// Sanitized label used for visualization outputs.
    pub label: String,
    /// Directory holding the helper scripts.
    pub scripts_dir: PathBuf,
    /// External programs.
    pub tools: ToolPaths,
}

impl RunConfig {
    /// Starts building a configuration from the two required inputs.
    #[must_use]
    pub fn builder(output_root: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> RunConfigBuilder {
        RunConfigBuilder::new(output_root, metadata)
    }
}

/// Builder validating every field before a [`RunConfig`] exists.
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    output_root: PathBuf,
    metadata: PathBuf,
    seq_type: SeqType,
    threads: usize,
    bootstrap: u32,
    workdir_override: Option<PathBuf>,
    debug: bool,
    exclude_pattern: Option<String>,
    filter_column: Option<String>,
    filter_value: Option<String>,
    group_by: Option<Vec<String>>,
    min_samples: Option<u32>,
    exclude_gaps: bool,
    domain_table: Option<PathBuf>,
    label: String,
    scripts_dir: Option<PathBuf>,
    tools: ToolPaths,
}

impl RunConfigBuilder {
    /// Creates a builder with the documented defaults.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            metadata: metadata.into(),
            seq_type: SeqType::Aa,
            threads: DEFAULT_THREADS,
            bootstrap: DEFAULT_BOOTSTRAP,
            workdir_override: None,
            debug: false,
            exclude_pattern: None,
            filter_column: None,
            filter_value: None,
            group_by: None,
            min_samples: None,
            exclude_gaps: false,
            domain_table: None,
            label: DEFAULT_LABEL.to_string(),
            scripts_dir: None,
            tools: ToolPaths::default(),
        }
    }

    /// Sets the sequence-type mode.
    #[must_use]
    pub fn with_seq_type(mut self, seq_type: SeqType) -> Self {
        self.seq_type = seq_type;
        self
    }

    /// Sets the thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the bootstrap replicate count.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: u32) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Overrides the transient working directory.
    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir_override = Some(workdir.into());
        self
    }

    /// Enables debug mode.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the sample-id exclusion pattern.
    #[must_use]
    pub fn with_exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_pattern = Some(pattern.into());
        self
    }

    /// Sets the metadata filter column.
    #[must_use]
    pub fn with_filter_column(mut self, column: impl Into<String>) -> Self {
        self.filter_column = Some(column.into());
        self
    }

    /// Sets the metadata filter value.
    #[must_use]
    pub fn with_filter_value(mut self, value: impl Into<String>) -> Self {
        self.filter_value = Some(value.into());
        self
    }

    /// Sets the group-by column list.
    #[must_use]
    pub fn with_group_by(mut self, columns: Vec<String>) -> Self {
        self.group_by = Some(columns);
        self
    }

    /// Sets the minimum-sample threshold.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: u32) -> Self {
        self.min_samples = Some(min_samples);
        self
    }

    /// Drops gap characters in the entropy computation.
    #[must_use]
    pub fn with_exclude_gaps(mut self, exclude_gaps: bool) -> Self {
        self.exclude_gaps = exclude_gaps;
        self
    }

    /// Sets the domain annotation table.
    #[must_use]
    pub fn with_domain_table(mut self, table: impl Into<PathBuf>) -> Self {
        self.domain_table = Some(table.into());
        self
    }

    /// Sets the visualization label (sanitized at build time).
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the helper-script directory.
    #[must_use]
    pub fn with_scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scripts_dir = Some(dir.into());
        self
    }

    /// Replaces the external programs (used by tests).
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Validates every field and produces the immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a non-positive thread count, a bootstrap
    /// count in `1..1000`, a half-given filter pair, an invalid exclusion
    /// regex or an empty group-by list.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads(self.threads));
        }
        if self.bootstrap != 0 && self.bootstrap < 1000 {
            return Err(ConfigError::InvalidBootstrap(self.bootstrap));
        }
        let filter = match (self.filter_column, self.filter_value) {
            (Some(column), Some(value)) => Some((column, value)),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteFilter),
        };
        if let Some(ref pattern) = self.exclude_pattern {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidExcludePattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }
        let group_by = match self.group_by {
            Some(columns) => {
                let columns: Vec<String> = columns
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                if columns.is_empty() {
                    return Err(ConfigError::EmptyGroupBy);
                }
                Some(columns)
            }
            None => None,
        };
        let scripts_dir = self.scripts_dir.unwrap_or_else(default_scripts_dir);

        Ok(RunConfig {
            output_root: self.output_root,
            metadata: self.metadata,
            seq_type: self.seq_type,
            threads: self.threads,
            bootstrap: self.bootstrap,
            workdir_override: self.workdir_override,
            debug: self.debug,
            exclude_pattern: self.exclude_pattern,
            filter,
            group_by,
            min_samples: self.min_samples,
            exclude_gaps: self.exclude_gaps,
            domain_table: self.domain_table,
            label: sanitize_label(&self.label),
            scripts_dir,
            tools: self.tools,
        })
    }
}

/// The `scripts/` directory shipped next to the executable.
///
/// Falls back to a bare relative `scripts/` when the executable path cannot
/// be determined.
#[must_use]
pub fn default_scripts_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| PathBuf::from("scripts"), |dir| dir.join("scripts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder() -> RunConfigBuilder {
        RunConfig::builder("/data/run", "/data/metadata.csv")
    }

    #[test]
    fn seq_type_tokens() {
        assert_eq!(SeqType::Aa.lowercase(), "aa");
        assert_eq!(SeqType::Aa.uppercase(), "AA");
        assert_eq!(SeqType::Dna.lowercase(), "dna");
        assert_eq!(SeqType::Dna.uppercase(), "DNA");
        assert_eq!("DNA".parse::<SeqType>().ok(), Some(SeqType::Dna));
        assert!("rna".parse::<SeqType>().is_err());
    }

    #[test]
    fn defaults_build() {
        let config = builder().build().expect("defaults are valid");
        assert_eq!(config.seq_type, SeqType::Aa);
        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(config.bootstrap, DEFAULT_BOOTSTRAP);
        assert_eq!(config.label, DEFAULT_LABEL);
        assert!(config.filter.is_none());
    }

    #[test]
    fn bootstrap_zero_and_thousand_accepted() {
        assert!(builder().with_bootstrap(0).build().is_ok());
        assert!(builder().with_bootstrap(1000).build().is_ok());
        assert!(builder().with_bootstrap(5000).build().is_ok());
    }

    #[test]
    fn bootstrap_below_thousand_rejected() {
        let err = builder().with_bootstrap(500).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidBootstrap(500));
        assert!(builder().with_bootstrap(1).build().is_err());
        assert!(builder().with_bootstrap(999).build().is_err());
    }

    #[test]
    fn zero_threads_rejected() {
        assert_eq!(
            builder().with_threads(0).build().unwrap_err(),
            ConfigError::InvalidThreads(0)
        );
    }

    #[test]
    fn filter_pair_must_be_complete() {
        assert_eq!(
            builder().with_filter_column("genotype").build().unwrap_err(),
            ConfigError::IncompleteFilter
        );
        assert_eq!(
            builder().with_filter_value("GT1").build().unwrap_err(),
            ConfigError::IncompleteFilter
        );
        let config = builder()
            .with_filter_column("genotype")
            .with_filter_value("GT1")
            .build()
            .expect("complete pair is valid");
        assert_eq!(
            config.filter,
            Some(("genotype".to_string(), "GT1".to_string()))
        );
    }

    #[test]
    fn exclude_pattern_must_be_valid_regex() {
        assert!(builder().with_exclude_pattern("^s0").build().is_ok());
        assert!(matches!(
            builder().with_exclude_pattern("(").build().unwrap_err(),
            ConfigError::InvalidExcludePattern { .. }
        ));
    }

    #[test]
    fn group_by_must_name_columns() {
        let err = builder()
            .with_group_by(vec![" ".to_string(), String::new()])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyGroupBy);

        let config = builder()
            .with_group_by(vec!["genotype".to_string(), " region ".to_string()])
            .build()
            .expect("usable columns");
        assert_eq!(
            config.group_by,
            Some(vec!["genotype".to_string(), "region".to_string()])
        );
    }

    #[test]
    fn label_is_sanitized_at_build() {
        let config = builder().with_label("My Run (2)").build().expect("valid");
        assert_eq!(config.label, "My_Run_2");
    }
}
