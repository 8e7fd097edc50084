//! Persisted configuration documents
//!
//! A document is a single JSON object carrying a `format_version`. Older
//! documents are upgraded in place, one version step at a time, before
//! being decoded; documents from a newer format are refused.

use crate::configuration::{Configuration, CrewSeat};
use crate::error::ConfigError;
use crate::id::ConfigId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Format version written by this build
pub const FORMAT_VERSION: u32 = 2;

/// On-disk form of a [`Configuration`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Format version tag
    pub format_version: u32,
    /// Configuration id
    pub id: ConfigId,
    /// Display name
    pub name: String,
    /// Target variant
    pub target: String,
    /// Crew seat the configuration is written for
    #[serde(default)]
    pub seat: CrewSeat,
    /// Time of the last save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// Per-subsystem stored state, each independently re-serializable
    #[serde(default)]
    pub subsystems: IndexMap<String, Value>,
    /// Subsystem name to linked configuration id
    #[serde(default)]
    pub links: BTreeMap<String, ConfigId>,
}

impl From<&Configuration> for ConfigDocument {
    fn from(config: &Configuration) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            id: config.id(),
            name: config.name().to_string(),
            target: config.target().to_string(),
            seat: config.seat(),
            saved_at: None,
            subsystems: config.raw_subsystems().clone(),
            links: config.links().clone(),
        }
    }
}

impl From<ConfigDocument> for Configuration {
    fn from(doc: ConfigDocument) -> Self {
        Configuration::from_parts(
            doc.id,
            doc.name,
            doc.target,
            doc.seat,
            doc.subsystems,
            doc.links,
        )
    }
}

/// Bring a raw document up to [`FORMAT_VERSION`]
///
/// Returns the version the document was written with. Documents without a
/// version tag are treated as version 1.
///
/// # Errors
/// Returns [`ConfigError::UnsupportedVersion`] for newer documents and
/// [`ConfigError::Serialization`] if the value is not an object
pub fn upgrade(doc: &mut Value) -> Result<u64, ConfigError> {
    let Some(object) = doc.as_object_mut() else {
        return Err(ConfigError::Serialization(serde::de::Error::custom(
            "configuration document must be a JSON object",
        )));
    };

    let found = object
        .get("format_version")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    if found > u64::from(FORMAT_VERSION) {
        return Err(ConfigError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }

    let mut version = found;
    while version < u64::from(FORMAT_VERSION) {
        if version == 1 {
            upgrade_v1(object);
        }
        version += 1;
        tracing::info!(version, "upgraded configuration document");
    }
    object.insert("format_version".to_string(), Value::from(FORMAT_VERSION));
    Ok(found)
}

// v1 named the radio subsystem `comm` and stored links as `[name, id]` pairs.
fn upgrade_v1(object: &mut Map<String, Value>) {
    if let Some(Value::Object(subsystems)) = object.get_mut("subsystems") {
        if let Some(comm) = subsystems.remove("comm") {
            subsystems.entry("radio").or_insert(comm);
        }
    }

    let mut links = Map::new();
    if let Some(Value::Array(pairs)) = object.remove("link_map") {
        for pair in pairs {
            match pair.as_array().map(Vec::as_slice) {
                Some([Value::String(name), id @ Value::String(_)]) => {
                    let name = if name == "comm" { "radio" } else { name.as_str() };
                    links.insert(name.to_string(), id.clone());
                }
                _ => tracing::warn!(?pair, "dropped malformed v1 link entry"),
            }
        }
    }
    object.insert("links".to_string(), Value::Object(links));
}

/// Encode a configuration as a document string
///
/// # Errors
/// Returns [`ConfigError::Serialization`] if encoding fails
pub fn to_json(config: &Configuration) -> Result<String, ConfigError> {
    let mut doc = ConfigDocument::from(config);
    doc.saved_at = Some(Utc::now());
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Decode a document string, upgrading older formats
///
/// # Errors
/// Returns [`ConfigError::Serialization`] for malformed documents and
/// [`ConfigError::UnsupportedVersion`] for newer ones
pub fn from_json(text: &str) -> Result<Configuration, ConfigError> {
    let mut raw: Value = serde_json::from_str(text)?;
    upgrade(&mut raw)?;
    let doc: ConfigDocument = serde_json::from_value(raw)?;
    Ok(doc.into())
}

/// Write a configuration document to `path`
///
/// # Errors
/// Returns [`ConfigError::Io`] if the file cannot be written
pub fn save(config: &Configuration, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let text = to_json(config)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), id = %config.id(), "saved configuration");
    Ok(())
}

/// Read a configuration document from `path`
///
/// # Errors
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise see
/// [`from_json`]
pub fn load(path: impl AsRef<Path>) -> Result<Configuration, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_json(&text)?;
    tracing::debug!(path = %path.display(), id = %config.id(), "loaded configuration");
    Ok(config)
}
