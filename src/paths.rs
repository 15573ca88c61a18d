//! Path handling for save archives and the extraction workspace
//!
//! This module handles:
//! - Deriving the `_modified` output path next to the source archive
//! - Locating the legacy fixed workspace next to the executable
//! - Converting workspace-relative paths to ZIP entry names

use std::path::{Path, PathBuf};

/// Suffix inserted before the extension of the repaired archive
pub const MODIFIED_SUFFIX: &str = "_modified";

/// Name of the fixed extraction directory used by `--workspace` defaults
pub const LEGACY_WORKSPACE_NAME: &str = "temp_zip_extraction";

/// Check if a path has a `.zip` extension (case-insensitive)
pub fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Get the path of the repaired archive for a source archive
///
/// `saves/world.zip` -> `saves/world_modified.zip`
///
/// Inputs without a `.zip` extension get `_modified.zip` appended to the
/// full file name so the source is never overwritten.
pub fn modified_archive_path(source: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let new_name = if has_zip_extension(source) {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}{}.{}", stem, MODIFIED_SUFFIX, ext)
    } else {
        format!("{}{}.zip", file_name, MODIFIED_SUFFIX)
    };

    source.with_file_name(new_name)
}

/// Get the directory a source archive lives in ("." for bare file names)
pub fn archive_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Get the legacy fixed workspace: `temp_zip_extraction` next to the executable
pub fn legacy_workspace_dir() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join(LEGACY_WORKSPACE_NAME)
}

/// Convert a workspace-relative path to a ZIP entry name (forward slashes)
/// `bibites\bibite_0.bb8` -> `bibites/bibite_0.bb8`
pub fn to_entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Create parent directories for a path if they don't exist
pub fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
