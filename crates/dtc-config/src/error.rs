//! Error types for configurations and links

use crate::id::ConfigId;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration id not present in the store
    #[error("unknown configuration {0}")]
    UnknownConfig(ConfigId),

    /// Configuration id already present in the store
    #[error("configuration {0} already exists")]
    DuplicateConfig(ConfigId),

    /// Link creation rejected
    #[error("link rejected: {0}")]
    Link(#[from] LinkError),

    /// Attempt to edit a subsystem whose settings are borrowed elsewhere
    #[error("subsystem '{subsystem}' is linked to configuration {target}")]
    Linked {
        /// Subsystem name
        subsystem: String,
        /// Configuration the subsystem is linked to
        target: ConfigId,
    },

    /// Stored subsystem state could not be decoded
    #[error("unreadable '{subsystem}' settings: {source}")]
    Subsystem {
        /// Subsystem name
        subsystem: String,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },

    /// Document (de)serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document written by a newer format
    #[error("format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the document
        found: u64,
        /// Newest version this build understands
        supported: u32,
    },

    /// File access failed
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Clipboard text is not a tagged payload
    #[error("clipboard does not hold a configuration payload")]
    NotAPayload,

    /// Clipboard payload is for a different subsystem
    #[error("clipboard holds '{found}' data, expected '{expected}'")]
    ClipboardMismatch {
        /// Tag the caller accepts
        expected: String,
        /// Tag on the payload
        found: String,
    },
}

impl ConfigError {
    /// Check if this is a rejected link
    #[inline]
    #[must_use]
    pub fn is_link_error(&self) -> bool {
        matches!(self, Self::Link(_))
    }

    /// Check if this is malformed stored data
    #[inline]
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Subsystem { .. } | Self::Serialization(_) | Self::UnsupportedVersion { .. }
        )
    }
}

/// Link integrity errors
///
/// Raised only when a link is created; resolution never re-checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// A configuration cannot link to itself
    #[error("'{subsystem}' cannot link a configuration to itself")]
    SelfLink {
        /// Subsystem name
        subsystem: String,
    },

    /// The new link would close a cycle
    #[error("'{subsystem}' link would create a cycle: {path:?}")]
    Cycle {
        /// Subsystem name
        subsystem: String,
        /// Chain from the linking configuration back to itself
        path: Vec<ConfigId>,
    },

    /// The chain behind the link target is too long
    #[error("'{subsystem}' link chain exceeds {max_hops} hops")]
    TooDeep {
        /// Subsystem name
        subsystem: String,
        /// Hop limit
        max_hops: usize,
    },

    /// Configurations for different aircraft cannot share settings
    #[error("cannot link '{from_target}' configuration to '{to_target}' configuration")]
    TargetMismatch {
        /// Target of the linking configuration
        from_target: String,
        /// Target of the linked configuration
        to_target: String,
    },

    /// A configuration in the chain does not exist
    #[error("link chain references unknown configuration {0}")]
    Dangling(ConfigId),
}
