//! Build context and upload preferences

use crate::error::BuildError;
use dtc_config::CrewSeat;
use dtc_registry::{ActionRegistry, Control};
use dtc_script::{ScriptBuilder, ScriptError, TargetSnapshot, DEFAULT_MAX_ITERATIONS};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Operator preferences that shape the generated script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Flash the caution light when the upload completes
    pub flash_on_complete: bool,
    /// Loop bound for convergence loops without an explicit bound
    pub default_max_iterations: u32,
    /// Settle delay override for keypad entry
    pub keypad_delay_ms: Option<u32>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            flash_on_complete: true,
            default_max_iterations: DEFAULT_MAX_ITERATIONS.get(),
            keypad_delay_ms: None,
        }
    }
}

impl UploadSettings {
    /// Loop bound as a checked non-zero value
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidSetting`] when the bound is zero
    pub fn max_iterations(&self) -> Result<NonZeroU32, BuildError> {
        NonZeroU32::new(self.default_max_iterations)
            .ok_or_else(|| BuildError::invalid("upload", "default_max_iterations must be at least 1"))
    }
}

/// Everything a subsystem builder may consult besides its own settings
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    registry: &'a ActionRegistry,
    snapshot: &'a TargetSnapshot,
    settings: &'a UploadSettings,
    seat: CrewSeat,
    max_iterations: NonZeroU32,
}

impl<'a> BuildContext<'a> {
    /// Create a context
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidSetting`] for a zero loop bound
    pub fn new(
        registry: &'a ActionRegistry,
        snapshot: &'a TargetSnapshot,
        settings: &'a UploadSettings,
        seat: CrewSeat,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            registry,
            snapshot,
            settings,
            seat,
            max_iterations: settings.max_iterations()?,
        })
    }

    /// Target action registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'a ActionRegistry {
        self.registry
    }

    /// State pre-fetched before building
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &'a TargetSnapshot {
        self.snapshot
    }

    /// Upload preferences
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &'a UploadSettings {
        self.settings
    }

    /// Crew seat of the configuration being built
    #[inline]
    #[must_use]
    pub fn seat(&self) -> CrewSeat {
        self.seat
    }

    /// Look up a control
    ///
    /// # Errors
    /// Returns [`BuildError::Registry`] if the target has no such action
    pub fn control(&self, device: &str, action: &str) -> Result<&'a Control, BuildError> {
        Ok(self.registry.lookup(device, action)?)
    }

    /// Fresh builder carrying the configured loop bound
    #[must_use]
    pub fn builder(&self) -> ScriptBuilder {
        ScriptBuilder::with_max_iterations(self.max_iterations)
    }

    /// Type `text` on a keypad device, honouring the keypad delay override
    ///
    /// # Errors
    /// Returns [`BuildError::Script`] if a character has no key; nothing is
    /// appended then
    pub fn keypad(&self, b: &mut ScriptBuilder, device: &str, text: &str) -> Result<(), BuildError> {
        let Some(delay) = self.settings.keypad_delay_ms else {
            b.keypad(self.registry, device, text)?;
            return Ok(());
        };

        let mut buf = [0u8; 4];
        let keys = text
            .chars()
            .map(|ch| {
                self.registry
                    .lookup(device, ch.encode_utf8(&mut buf))
                    .map_err(|_| ScriptError::UnmappedKey {
                        device: device.to_string(),
                        ch,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        for key in keys {
            b.action_with_delay(key, delay);
        }
        Ok(())
    }
}
