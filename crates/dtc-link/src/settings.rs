//! Link settings

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Command channel port (TCP)
pub const DEFAULT_COMMAND_PORT: u16 = 42001;
/// Telemetry channel port (UDP)
pub const DEFAULT_TELEMETRY_PORT: u16 = 42002;
/// Capture channel port (UDP)
pub const DEFAULT_CAPTURE_PORT: u16 = 42003;

/// Network and timing parameters of a cockpit link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Cockpit host
    pub host: String,
    /// Command channel port
    pub command_port: u16,
    /// Local telemetry port
    pub telemetry_port: u16,
    /// Local capture port
    pub capture_port: u16,
    /// Pause between `While` polls
    pub poll_interval_ms: u64,
    /// Command channel connect timeout
    pub connect_timeout_ms: u64,
    /// Telemetry older than this cannot answer a predicate
    pub stale_after_ms: u64,
    /// How long to wait for pre-fetch answers
    pub query_timeout_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            command_port: DEFAULT_COMMAND_PORT,
            telemetry_port: DEFAULT_TELEMETRY_PORT,
            capture_port: DEFAULT_CAPTURE_PORT,
            poll_interval_ms: 250,
            connect_timeout_ms: 3000,
            stale_after_ms: 2000,
            query_timeout_ms: 1500,
        }
    }
}

impl LinkSettings {
    /// Parse from TOML
    ///
    /// # Errors
    /// Returns [`SettingsError::Parse`] for invalid TOML
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Read from a TOML file
    ///
    /// # Errors
    /// Returns [`SettingsError`] if the file is unreadable or invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Remote command address
    #[must_use]
    pub fn command_addr(&self) -> String {
        format!("{}:{}", self.host, self.command_port)
    }

    /// Local telemetry bind address
    #[must_use]
    pub fn telemetry_bind(&self) -> String {
        format!("0.0.0.0:{}", self.telemetry_port)
    }

    /// Local capture bind address
    #[must_use]
    pub fn capture_bind(&self) -> String {
        format!("0.0.0.0:{}", self.capture_port)
    }

    /// Poll interval
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Staleness limit
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}
