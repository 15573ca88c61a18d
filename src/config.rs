//! Repair configuration
//!
//! Defines how a repair run manages its extraction workspace.

use std::path::{Path, PathBuf};

/// Where the archive gets extracted during a repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkspaceMode {
    /// Uniquely named temp directory next to the archive, removed on every exit path
    #[default]
    Scoped,

    /// Fixed directory, cleared before use, removed on success and kept on
    /// failure so the extracted files can be inspected
    Fixed(PathBuf),
}

/// Configuration for a repair run
#[derive(Debug, Clone, Default)]
pub struct RepairConfig {
    /// Extraction workspace strategy
    pub workspace: WorkspaceMode,
}

impl RepairConfig {
    /// Use a fixed workspace directory instead of a scoped temp directory
    pub fn with_fixed_workspace(dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace: WorkspaceMode::Fixed(dir.into()),
        }
    }

    /// Validate the configuration against the archive being repaired
    pub fn validate(&self, archive_path: &Path) -> Result<(), ConfigError> {
        let WorkspaceMode::Fixed(dir) = &self.workspace else {
            return Ok(());
        };

        if dir.is_file() {
            return Err(ConfigError::WorkspaceIsFile(dir.clone()));
        }

        // A fixed workspace is wiped before extraction
        if dir.exists() {
            let workspace = dir.canonicalize().unwrap_or_else(|_| dir.clone());
            let archive = archive_path
                .canonicalize()
                .unwrap_or_else(|_| archive_path.to_path_buf());
            if archive.starts_with(&workspace) {
                return Err(ConfigError::WorkspaceContainsArchive(dir.clone()));
            }
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Workspace path is a file: {0}")]
    WorkspaceIsFile(PathBuf),

    #[error("Workspace directory {0} contains the save archive and would be wiped")]
    WorkspaceContainsArchive(PathBuf),
}
