//! Error types for script construction

use dtc_registry::RegistryError;

/// Script construction and encoding errors
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Control lookup or position selection failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A loop was requested with zero iterations
    #[error("loop on '{predicate}' must allow at least one iteration")]
    ZeroIterations {
        /// Loop predicate
        predicate: String,
    },

    /// A decoded script contains a loop without a usable bound
    #[error("unbounded loop at instruction path {path:?}")]
    UnboundedLoop {
        /// Index path from the root to the offending loop
        path: Vec<usize>,
    },

    /// Keypad text contains a character the device has no key for
    #[error("no key for '{ch}' on device '{device}'")]
    UnmappedKey {
        /// Device name
        device: String,
        /// Offending character
        ch: char,
    },

    /// Envelope encoding failed
    #[error("encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
