//! Build errors

use dtc_config::ConfigError;
use dtc_registry::RegistryError;
use dtc_script::ScriptError;

/// Errors raised while assembling an upload script
///
/// Any of these abandons assembly; no partial script is produced.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A builder referenced an action the target does not have
    #[error("registry lookup failed: {0}")]
    Registry(#[from] RegistryError),

    /// Script construction failed
    #[error("script construction failed: {0}")]
    Script(#[from] ScriptError),

    /// Configuration or link data could not be used
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No target definition exists for this name
    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    /// Configuration belongs to another target
    #[error("configuration is for '{found}', orchestrator builds '{expected}'")]
    TargetMismatch {
        /// Orchestrator target
        expected: String,
        /// Configuration target
        found: String,
    },

    /// A setting value cannot be expressed on the target
    #[error("invalid '{subsystem}' setting: {reason}")]
    InvalidSetting {
        /// Subsystem name
        subsystem: String,
        /// Description
        reason: String,
    },
}

impl BuildError {
    /// Check if this error stems from the configuration's data
    ///
    /// Data errors are reported to the operator as a failed operation with
    /// details in the log; the rest are programming errors in builders or
    /// tables.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::Config(err) => err.is_data_error() || err.is_link_error(),
            Self::Script(ScriptError::UnmappedKey { .. }) => true,
            Self::InvalidSetting { .. } | Self::TargetMismatch { .. } | Self::UnknownTarget(_) => {
                true
            }
            Self::Registry(_) | Self::Script(_) => false,
        }
    }

    pub(crate) fn invalid(subsystem: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            subsystem: subsystem.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_action_is_not_data_error() {
        let err: BuildError = RegistryError::NotFound {
            target: "f16c".into(),
            device: "UFC".into(),
            action: "CLR".into(),
        }
        .into();
        assert!(!err.is_data_error());
    }

    #[test]
    fn unmapped_key_is_data_error() {
        let err: BuildError = ScriptError::UnmappedKey {
            device: "UFC".into(),
            ch: 'x',
        }
        .into();
        assert!(err.is_data_error());
        assert!(BuildError::invalid("misc", "channel 0").is_data_error());
    }
}
