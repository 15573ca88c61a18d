//! Extraction workspace lifecycle.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::WorkspaceMode;
use crate::error::RepairError;
use crate::paths;

/// Directory an archive is extracted into for the duration of one run
#[derive(Debug)]
pub enum Workspace {
    /// Removed when dropped, whatever the outcome
    Scoped(TempDir),
    /// Removed only through [`Workspace::cleanup`]
    Fixed(PathBuf),
}

impl Workspace {
    /// Create an empty workspace for a run on `archive_path`
    pub fn create(mode: &WorkspaceMode, archive_path: &Path) -> Result<Self, RepairError> {
        match mode {
            WorkspaceMode::Scoped => {
                let base = paths::archive_dir(archive_path);
                let dir = tempfile::Builder::new()
                    .prefix(".bibite_repair_")
                    .tempdir_in(&base)
                    .map_err(|source| RepairError::Workspace { path: base, source })?;
                debug!("Created scoped workspace {}", dir.path().display());
                Ok(Workspace::Scoped(dir))
            }
            WorkspaceMode::Fixed(dir) => {
                // Leftovers from a failed run would end up in the new archive
                if dir.exists() {
                    debug!("Clearing stale workspace {}", dir.display());
                    fs::remove_dir_all(dir).map_err(|source| RepairError::Workspace {
                        path: dir.clone(),
                        source,
                    })?;
                }
                fs::create_dir_all(dir).map_err(|source| RepairError::Workspace {
                    path: dir.clone(),
                    source,
                })?;
                Ok(Workspace::Fixed(dir.clone()))
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Workspace::Scoped(dir) => dir.path(),
            Workspace::Fixed(dir) => dir.as_path(),
        }
    }

    /// Delete the workspace after a successful run
    pub fn cleanup(self) -> Result<(), RepairError> {
        match self {
            Workspace::Scoped(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()
                    .map_err(|source| RepairError::Workspace { path, source })
            }
            Workspace::Fixed(dir) => fs::remove_dir_all(&dir)
                .map_err(|source| RepairError::Workspace { path: dir, source }),
        }
    }

    /// Give up on the workspace after a failed run
    pub fn abandon(self) {
        match self {
            Workspace::Scoped(dir) => drop(dir),
            Workspace::Fixed(dir) => {
                warn!("Keeping workspace for inspection: {}", dir.display());
            }
        }
    }
}
