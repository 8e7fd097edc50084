//! Transport and execution errors

use dtc_script::ScriptError;
use std::path::PathBuf;

/// Command or telemetry channel failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Command channel could not be opened
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        /// Remote address
        addr: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Command channel did not open in time
    #[error("connection to {addr} timed out after {timeout_ms} ms")]
    ConnectTimeout {
        /// Remote address
        addr: String,
        /// Timeout
        timeout_ms: u64,
    },

    /// A listening socket could not be bound
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Local address
        addr: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Channel I/O failed
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope could not be encoded
    #[error("envelope encoding failed: {0}")]
    Encoding(#[from] ScriptError),

    /// Remote side closed the channel
    #[error("command channel closed")]
    Closed,
}

/// Errors that stop a script before it completes
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Command channel lost mid-upload
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// No recent telemetry when a predicate had to be evaluated
    #[error("telemetry is stale evaluating '{predicate}' (last frame {age})")]
    TelemetryStale {
        /// Predicate being evaluated
        predicate: String,
        /// Age of the newest frame, if any arrived
        age: StaleAge,
    },

    /// Script failed validation
    #[error("invalid script: {0}")]
    InvalidScript(#[from] ScriptError),

    /// Another upload holds the link
    #[error("an upload is already in progress on this link")]
    UploadInProgress,
}

/// Age of the newest telemetry frame when it was found stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleAge {
    /// No frame received yet
    Never,
    /// Milliseconds since the newest frame
    Millis(u64),
}

impl std::fmt::Display for StaleAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => f.write_str("never received"),
            Self::Millis(ms) => write!(f, "{ms} ms ago"),
        }
    }
}

impl ExecutionError {
    /// Check if a channel failed; the upload is incomplete
    #[inline]
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::TelemetryStale { .. })
    }
}

/// Settings file errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read
    #[error("cannot read settings {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the settings
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}
