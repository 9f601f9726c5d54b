//! Loading configuration documents from disk.
//!
//! Every document goes through the canonicalizer, so the schema validator and
//! the field groups see the same text-keyed tree.

use quaycfg_core::{Mapping, Value, canonicalize};
use std::path::Path;

use crate::{ConfigError, ConfigResult};

/// Parse YAML text into a canonical JSON tree.
pub fn parse_yaml(text: &str) -> ConfigResult<serde_json::Value> {
    let raw: serde_yaml::Value = serde_yaml::from_str(text)?;
    Ok(canonicalize(&raw)?)
}

/// Parse JSON text into a canonical JSON tree.
pub fn parse_json(text: &str) -> ConfigResult<serde_json::Value> {
    serde_json::from_str(text).map_err(ConfigError::DocumentJson)
}

/// Read a document, choosing the parser by extension.
///
/// `.json` files parse as JSON; everything else parses as YAML.
pub fn read_canonical(path: &Path) -> ConfigResult<serde_json::Value> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    tracing::debug!(path = %path.display(), json = is_json, "loading config document");
    if is_json { parse_json(&text) } else { parse_yaml(&text) }
}

/// Turn a canonical tree into the top-level document mapping.
pub fn into_document(json: serde_json::Value) -> ConfigResult<Mapping> {
    match Value::from_json(json) {
        Value::Map(map) => Ok(map),
        other => Err(ConfigError::DocumentShape(other.kind().to_string())),
    }
}

/// Read a document from disk as a top-level mapping.
pub fn load_document(path: &Path) -> ConfigResult<Mapping> {
    into_document(read_canonical(path)?)
}
