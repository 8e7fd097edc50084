//! Error types for the action registry

/// Registry errors
///
/// `NotFound` is a programming error in a subsystem builder: the builder
/// referenced an action the target does not have. Callers propagate it so
/// the upload is abandoned instead of silently missing a step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No device with this name
    #[error("unknown device '{device}' for target '{target}'")]
    UnknownDevice {
        /// Target variant
        target: String,
        /// Requested device
        device: String,
    },

    /// Device exists but has no such action
    #[error("action '{action}' not found on device '{device}' for target '{target}'")]
    NotFound {
        /// Target variant
        target: String,
        /// Device name
        device: String,
        /// Requested action
        action: String,
    },

    /// Value index out of range for a multi-position control
    #[error("control '{control}' has {available} positions, index {index} requested")]
    InvalidPosition {
        /// Control name
        control: String,
        /// Requested index
        index: usize,
        /// Number of positions
        available: usize,
    },

    /// Static table could not be parsed or is inconsistent
    #[error("invalid registry table for '{target}': {reason}")]
    InvalidTable {
        /// Target variant
        target: String,
        /// What is wrong
        reason: String,
    },

    /// No builtin table for this target
    #[error("no builtin action table for target '{0}'")]
    UnknownTarget(String),
}

impl RegistryError {
    /// Check whether the error points at a builder referencing a missing action
    #[inline]
    #[must_use]
    pub fn is_missing_action(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnknownDevice { .. })
    }
}
