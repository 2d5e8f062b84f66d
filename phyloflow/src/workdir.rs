//! Scoped transient working directory.
//!
//! The directory lives for exactly one run. Dropping the handle removes it
//! on every exit path; debug mode suppresses removal and reports the path so
//! the operator can inspect intermediate files.

use crate::config::RunConfig;
use crate::errors::PhyloflowError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Owner of the transient working directory.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    retain: bool,
}

impl WorkDir {
    /// Creates the working directory for a run.
    ///
    /// Uses the configured override when given, otherwise a uniquely named
    /// directory under the system temp dir. Debug mode turns on retention.
    ///
    /// # Errors
    ///
    /// [`PhyloflowError::Io`] when the directory cannot be created.
    pub fn acquire(config: &RunConfig) -> Result<Self, PhyloflowError> {
        let path = config.workdir_override.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("phyloflow_{}", short_id()))
        });
        fs::create_dir_all(&path)?;
        info!("working directory: {}", path.display());
        Ok(Self {
            path,
            retain: config.debug,
        })
    }

    /// The directory's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory survives the run.
    #[must_use]
    pub const fn is_retained(&self) -> bool {
        self.retain
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.retain {
            info!("debug mode: retaining working directory {}", self.path.display());
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("failed to remove working directory {}: {e}", self.path.display());
        }
    }
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
