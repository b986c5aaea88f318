//! Scratch directory with stage-then-swap replacement.
//!
//! A preview generation is built in a sibling staging directory and moved
//! into place only once complete, so the server never serves a
//! half-written tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ArbiterError, Result};

/// The scratch directory location.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scratch".to_string());
        self.path.with_file_name(format!("{}.staging", name))
    }

    /// Start a new generation in a clean staging directory.
    pub fn acquire(&self) -> Result<StagedScratch> {
        let staging = self.staging_path();
        remove_dir_if_exists(&staging)
            .map_err(|e| ArbiterError::io(&staging, "Failed to clear staging directory", e))?;
        fs::create_dir_all(&staging)
            .map_err(|e| ArbiterError::io(&staging, "Failed to create staging directory", e))?;

        debug!(staging = %staging.display(), "scratch generation acquired");
        Ok(StagedScratch {
            staging,
            target: self.path.clone(),
            committed: false,
        })
    }
}

/// A generation being built. Dropped without [`StagedScratch::commit`], it
/// is discarded.
#[derive(Debug)]
pub struct StagedScratch {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedScratch {
    /// Where the generation is being written.
    pub fn path(&self) -> &Path {
        &self.staging
    }

    /// Replace the previous generation with this one.
    pub fn commit(mut self) -> Result<PathBuf> {
        remove_dir_if_exists(&self.target)
            .map_err(|e| ArbiterError::io(&self.target, "Failed to remove previous scratch", e))?;
        fs::rename(&self.staging, &self.target)
            .map_err(|e| ArbiterError::io(&self.target, "Failed to move scratch into place", e))?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedScratch {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = remove_dir_if_exists(&self.staging) {
                warn!(staging = %self.staging.display(), "cannot discard staging directory: {}", e);
            }
        }
    }
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
