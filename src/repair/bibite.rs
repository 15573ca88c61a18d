//! Bibite record fixes for saves converted by 0.6.0.1.
//!
//! The broken migration left three fields in every bibite with wrong values:
//! - `genes.genes.MouthMusclesWAG` scaled down by a power of ten
//! - the egg-production node's `baseActivation` too low to ever fire
//! - `body.eggLayer.eggProgress` stuck at zero
//!
//! Each fix touches only its own field. Everything else in the record,
//! including fields this tool knows nothing about, is written back as read.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Number, Value};
use tracing::debug;

use super::sink::{report, LogSink};
use crate::encoding;
use crate::error::RepairError;

/// Folder holding one JSON record per bibite
pub const BIBITES_DIR: &str = "bibites";

/// Index of the egg-production node in `brain.Nodes`.
///
/// This is the fixed position of that node in the 0.6.0.1 brain layout, not
/// a lookup by name. Saves from a release with a different node layout will
/// get the wrong node boosted.
pub const EGG_PRODUCTION_NODE: usize = 35;

/// Added to the egg-production node's base activation
pub const EGG_ACTIVATION_BOOST: f64 = 0.4;

const MOUTH_MUSCLES_PATH: &str = "genes.genes.MouthMusclesWAG";
const NODES_PATH: &str = "brain.Nodes";
const BASE_ACTIVATION_PATH: &str = "brain.Nodes[35].baseActivation";
const EGG_PROGRESS_PATH: &str = "body.eggLayer.eggProgress";

/// Structural problems in a bibite record
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("field {0} is not a number")]
    NotANumber(&'static str),

    #[error("field {0} is not an array")]
    NotAnArray(&'static str),

    #[error("brain.Nodes has {found} entries, the egg production node is index 35")]
    TooFewNodes { found: usize },

    #[error("field {0} would become {1}, which JSON cannot store")]
    NonFinite(&'static str, f64),
}

/// Undo the power-of-ten scaling on the mouth muscle gain
///
/// The value is written in scientific notation with six fractional digits;
/// a negative exponent is removed by multiplying by `10^|exponent|`. A result
/// of zero becomes `1.0` so the muscle still works.
pub fn normalize_mouth_muscles(value: f64) -> f64 {
    let mut value = value;
    if let Some(exponent) = scientific_exponent(value) {
        if exponent < 0 {
            value *= 10f64.powi(-exponent);
        }
    }
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

/// Decimal exponent of `value` as printed in `d.dddddde±x` form
fn scientific_exponent(value: f64) -> Option<i32> {
    let formatted = format!("{:.6e}", value);
    formatted
        .rsplit_once('e')
        .and_then(|(_, exponent)| exponent.parse().ok())
}

/// Raise the egg-production node's base activation
pub fn boost_egg_activation(value: f64) -> f64 {
    value + EGG_ACTIVATION_BOOST
}

/// Restart egg progress that is stuck at exactly zero
pub fn kickstart_egg_progress(value: f64) -> f64 {
    if value == 0.0 {
        value + 1.0
    } else {
        value
    }
}

/// Apply all three fixes to a parsed bibite record, in order
pub fn patch_record(record: &mut Value, sink: &mut dyn LogSink) -> Result<(), PatchError> {
    report(sink, "Increasing Jaw Muscles WAG by removing the e-");
    let wag = field_mut(record, MOUTH_MUSCLES_PATH, &["genes", "genes", "MouthMusclesWAG"])?;
    let old = as_f64(wag, MOUTH_MUSCLES_PATH)?;
    let new = normalize_mouth_muscles(old);
    if new != old {
        *wag = float_value(new, MOUTH_MUSCLES_PATH)?;
    }
    debug!("MouthMusclesWAG {} -> {}", old, new);

    report(sink, "Increasing Egg Production node by 0.4");
    let nodes = field_mut(record, NODES_PATH, &["brain", "Nodes"])?
        .as_array_mut()
        .ok_or(PatchError::NotAnArray(NODES_PATH))?;
    let found = nodes.len();
    let node = nodes
        .get_mut(EGG_PRODUCTION_NODE)
        .ok_or(PatchError::TooFewNodes { found })?;
    let activation = field_mut(node, BASE_ACTIVATION_PATH, &["baseActivation"])?;
    let old = as_f64(activation, BASE_ACTIVATION_PATH)?;
    let new = boost_egg_activation(old);
    *activation = float_value(new, BASE_ACTIVATION_PATH)?;
    debug!("baseActivation {} -> {}", old, new);

    report(sink, "Increasing egg Progress by 1 if it is 0.0");
    let progress = field_mut(record, EGG_PROGRESS_PATH, &["body", "eggLayer", "eggProgress"])?;
    let old = as_f64(progress, EGG_PROGRESS_PATH)?;
    let new = kickstart_egg_progress(old);
    if new != old {
        // Integer zero stays an integer, like the game would read it back
        *progress = if progress.is_f64() {
            float_value(new, EGG_PROGRESS_PATH)?
        } else {
            Value::from(1)
        };
    }

    Ok(())
}

/// Walk nested object keys, reporting the full field path on failure
fn field_mut<'a>(
    value: &'a mut Value,
    path: &'static str,
    keys: &[&str],
) -> Result<&'a mut Value, PatchError> {
    let mut current = value;
    for key in keys {
        current = current
            .get_mut(*key)
            .ok_or(PatchError::MissingField(path))?;
    }
    Ok(current)
}

fn as_f64(value: &Value, path: &'static str) -> Result<f64, PatchError> {
    value.as_f64().ok_or(PatchError::NotANumber(path))
}

fn float_value(value: f64, path: &'static str) -> Result<Value, PatchError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(PatchError::NonFinite(path, value))
}

/// Serialize a record the way the repair writes it: four-space indentation,
/// keys in their original order
pub fn to_pretty_json(record: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    record.serialize(&mut serializer)?;
    Ok(out)
}

/// List the record files in the bibites folder, in file-name order
///
/// A save without a bibites folder has nothing to patch.
pub fn bibite_files(workspace: &Path) -> Result<Vec<PathBuf>, RepairError> {
    let dir = workspace.join(BIBITES_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| RepairError::io(&dir, e))? {
        let entry = entry.map_err(|e| RepairError::io(&dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!("Skipping non-file in bibites folder: {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

/// Rewrite one bibite record file in place
pub fn patch_file(path: &Path, sink: &mut dyn LogSink) -> Result<(), RepairError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let bytes = fs::read(path).map_err(|e| RepairError::io(path, e))?;
    let (text, text_encoding) =
        encoding::decode(&bytes).map_err(|_| RepairError::Encoding(path.to_path_buf()))?;

    let mut record: Value =
        serde_json::from_str(&text).map_err(|source| RepairError::EntityMalformed {
            file: file.clone(),
            source,
        })?;

    patch_record(&mut record, sink).map_err(|source| RepairError::Entity {
        file: file.clone(),
        source,
    })?;

    let body = to_pretty_json(&record)
        .map_err(|source| RepairError::EntityMalformed { file, source })?;
    fs::write(path, encoding::encode(&body, text_encoding)).map_err(|e| RepairError::io(path, e))
}
