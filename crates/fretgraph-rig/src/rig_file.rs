//! Rig file loading and saving: the JSON schema of spec §6.
//!
//! A rig file is just a serialized [`RigDescription`]; every field default
//! lives on the model types themselves (`RigMetadata::default_author`,
//! `NodeDescriptor::bypassed`, etc.) so this module is a thin, deterministic
//! read/write boundary rather than a second copy of the schema.

use std::fs;
use std::path::Path;

use crate::error::RigError;
use crate::model::RigDescription;

/// Loads a rig description from a JSON file on disk.
///
/// Missing optional fields (`author`, `bypassed`, `config`, ...) fall back to
/// the model's own `serde(default)` values, so files written by an older
/// schema version still load.
pub fn load_rig(path: impl AsRef<Path>) -> Result<RigDescription, RigError> {
    let text = fs::read_to_string(path)?;
    load_rig_str(&text)
}

/// Parses a rig description from an in-memory JSON string.
pub fn load_rig_str(json: &str) -> Result<RigDescription, RigError> {
    let rig = serde_json::from_str(json)?;
    Ok(rig)
}

/// Saves a rig description as pretty-printed, deterministically ordered JSON.
///
/// Field order follows the struct declaration (not alphabetical), and
/// parameter maps are `BTreeMap`s, so two saves of the same rig produce
/// byte-identical output — the format is meant to diff cleanly under
/// version control.
pub fn save_rig(path: impl AsRef<Path>, rig: &RigDescription) -> Result<(), RigError> {
    let text = save_rig_str(rig)?;
    fs::write(path, text)?;
    Ok(())
}

/// Serializes a rig description to a pretty-printed JSON string.
pub fn save_rig_str(rig: &RigDescription) -> Result<String, RigError> {
    let text = serde_json::to_string_pretty(rig)?;
    Ok(text)
}
