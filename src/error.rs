//! Repair errors
//!
//! Every stage of the repair pipeline returns `Result<_, RepairError>`.
//! Callers decide how to surface a failure; [`RepairError::user_message`]
//! gives the text shown to the player.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::repair::bibite::PatchError;

/// Errors produced while repairing a save archive
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("No save file selected")]
    NoFileSelected,

    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Save archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    #[error("Not a valid ZIP file: {path}: {source}")]
    NotAZip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("scene.bb8scene not found")]
    SceneNotFound,

    #[error("scene.bb8scene is not valid JSON: {0}")]
    SceneMalformed(#[source] serde_json::Error),

    #[error("scene.bb8scene is not a JSON object")]
    SceneNotObject,

    #[error("{file} is not valid JSON: {source}")]
    EntityMalformed {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to fix {file}: {source}")]
    Entity {
        file: String,
        #[source]
        source: PatchError,
    },

    #[error("{0} is not valid UTF-8")]
    Encoding(PathBuf),

    #[error("Workspace error at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RepairError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        RepairError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this failure happened before the pipeline started
    pub fn is_input_error(&self) -> bool {
        matches!(self, RepairError::NoFileSelected | RepairError::NotAFile(_))
    }

    /// Message shown to the player in the error dialog
    pub fn user_message(&self) -> String {
        match self {
            RepairError::NoFileSelected | RepairError::NotAFile(_) => {
                "Please select a valid ZIP file.".to_string()
            }
            RepairError::NotAZip { .. } => {
                "The selected file is not a valid ZIP file.".to_string()
            }
            RepairError::SceneNotFound => "scene.bb8scene not found.".to_string(),
            RepairError::SceneMalformed(_) => {
                "scene.bb8scene is not a valid JSON file.".to_string()
            }
            other => format!("An error occurred: {}", other),
        }
    }
}
