//! Scene descriptor (`scene.bb8scene`) version lookup.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::encoding;
use crate::error::RepairError;

/// Scene descriptor at the archive root
pub const SCENE_FILE: &str = "scene.bb8scene";

/// Version reported when the descriptor has no `version` field
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Read the save version from the scene descriptor in an extracted save
pub fn read_version(workspace: &Path) -> Result<String, RepairError> {
    let path = workspace.join(SCENE_FILE);
    if !path.is_file() {
        return Err(RepairError::SceneNotFound);
    }

    let bytes = fs::read(&path).map_err(|e| RepairError::io(&path, e))?;
    let (text, _) = encoding::decode(&bytes).map_err(|_| RepairError::Encoding(path.clone()))?;
    parse_version(&text)
}

/// Extract the version from scene descriptor JSON
///
/// A missing `version` yields [`UNKNOWN_VERSION`]; a non-string value is
/// rendered as its JSON text so it can still be reported.
pub fn parse_version(text: &str) -> Result<String, RepairError> {
    let scene: Value = serde_json::from_str(text).map_err(RepairError::SceneMalformed)?;
    let scene = scene.as_object().ok_or(RepairError::SceneNotObject)?;

    Ok(match scene.get("version") {
        Some(Value::String(version)) => version.clone(),
        Some(other) => other.to_string(),
        None => UNKNOWN_VERSION.to_string(),
    })
}
