//! Settings management for the repair window
//!
//! Stores user preferences in ~/.config/bibite-repair/settings.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::RepairConfig;
use crate::paths;

/// User settings for the repair window
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Directory the file picker opens in
    #[serde(default)]
    pub last_directory: String,

    /// Extract into a fixed directory that is kept when a repair fails
    #[serde(default)]
    pub keep_failed_workspace: bool,

    /// Fixed workspace directory (empty = `temp_zip_extraction` next to the executable)
    #[serde(default)]
    pub workspace_dir: String,
}

impl Settings {
    /// Get the config directory path (~/.config/bibite-repair)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("bibite-repair");

        Ok(config_dir)
    }

    /// Get the settings file path
    fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Could not load settings: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Try to load settings, returning error on failure
    fn try_load() -> Result<Self> {
        let path = Self::settings_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;

        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {:?}", config_dir))?;

        let path = Self::settings_path()?;
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Remember the directory of the save the user picked
    pub fn remember_selection(&mut self, save_path: &Path) {
        self.last_directory = paths::archive_dir(save_path).display().to_string();
    }

    /// Build the repair configuration these settings describe
    pub fn repair_config(&self) -> RepairConfig {
        if !self.keep_failed_workspace {
            return RepairConfig::default();
        }

        if self.workspace_dir.is_empty() {
            RepairConfig::with_fixed_workspace(paths::legacy_workspace_dir())
        } else {
            RepairConfig::with_fixed_workspace(&self.workspace_dir)
        }
    }
}
