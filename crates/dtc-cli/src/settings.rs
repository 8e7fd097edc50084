//! Operator settings file

use anyhow::{Context, Result};
use dtc_core::UploadSettings;
use dtc_link::LinkSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Combined `[link]` and `[upload]` settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// Network and timing parameters
    pub link: LinkSettings,
    /// Script shaping preferences
    pub upload: UploadSettings,
}

impl CliSettings {
    /// Parse from TOML
    ///
    /// # Errors
    /// Returns an error for malformed TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid settings file")
    }

    /// Load from `path`, or defaults when no path is given
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read settings {}", path.display()))?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}
