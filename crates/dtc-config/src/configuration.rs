//! Configuration aggregate
//!
//! Subsystem settings are held in their serialized form so that each one can
//! be copied, exported or re-linked in isolation, and so that a corrupt
//! entry only affects its own subsystem.

use crate::error::ConfigError;
use crate::id::ConfigId;
use crate::setting::SubsystemSetting;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Crew position a configuration is uploaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewSeat {
    /// Front seat (pilot)
    #[default]
    Front,
    /// Rear seat (weapons systems officer)
    Rear,
}

impl CrewSeat {
    /// Lowercase name, as reported by the cockpit
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Rear => "rear",
        }
    }
}

impl fmt::Display for CrewSeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named avionics configuration for one target
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    id: ConfigId,
    name: String,
    target: String,
    seat: CrewSeat,
    subsystems: IndexMap<String, Value>,
    links: BTreeMap<String, ConfigId>,
}

impl Configuration {
    /// Create an all-default configuration with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::from_parts(
            ConfigId::new(),
            name.into(),
            target.into(),
            CrewSeat::default(),
            IndexMap::new(),
            BTreeMap::new(),
        )
    }

    pub(crate) fn from_parts(
        id: ConfigId,
        name: String,
        target: String,
        seat: CrewSeat,
        subsystems: IndexMap<String, Value>,
        links: BTreeMap<String, ConfigId>,
    ) -> Self {
        Self {
            id,
            name,
            target,
            seat,
            subsystems,
            links,
        }
    }

    /// Configuration id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConfigId {
        self.id
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Target variant identifier
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Crew seat the upload expects
    #[inline]
    #[must_use]
    pub fn seat(&self) -> CrewSeat {
        self.seat
    }

    /// Change the expected crew seat
    pub fn set_seat(&mut self, seat: CrewSeat) {
        self.seat = seat;
    }

    /// Builder-style seat selection
    #[inline]
    #[must_use]
    pub fn with_seat(mut self, seat: CrewSeat) -> Self {
        self.seat = seat;
        self
    }

    /// Decode a subsystem's local settings
    ///
    /// Missing entries decode as the default instance.
    ///
    /// # Errors
    /// Returns [`ConfigError::Subsystem`] if the stored entry is unreadable
    pub fn setting<S: SubsystemSetting>(&self) -> Result<S, ConfigError> {
        match self.subsystems.get(S::NAME) {
            None => Ok(S::default()),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|source| {
                ConfigError::Subsystem {
                    subsystem: S::NAME.to_string(),
                    source,
                }
            }),
        }
    }

    /// Decode a subsystem's local settings, substituting defaults for
    /// unreadable state
    #[must_use]
    pub fn setting_or_default<S: SubsystemSetting>(&self) -> S {
        self.setting().unwrap_or_else(|err| {
            tracing::warn!(config = %self.id, error = %err, "using defaults for unreadable settings");
            S::default()
        })
    }

    /// Store a subsystem's settings
    ///
    /// Default settings are stored as absent.
    ///
    /// # Errors
    /// Returns [`ConfigError::Linked`] if the subsystem is linked elsewhere,
    /// or [`ConfigError::Serialization`] if encoding fails
    pub fn set_setting<S: SubsystemSetting>(&mut self, settings: &S) -> Result<(), ConfigError> {
        if let Some(target) = self.link_target(S::NAME) {
            return Err(ConfigError::Linked {
                subsystem: S::NAME.to_string(),
                target,
            });
        }
        if settings.is_default() {
            self.subsystems.shift_remove(S::NAME);
        } else {
            self.subsystems
                .insert(S::NAME.to_string(), serde_json::to_value(settings)?);
        }
        Ok(())
    }

    /// Reset a subsystem to defaults
    pub fn reset(&mut self, subsystem: &str) {
        self.subsystems.shift_remove(subsystem);
    }

    /// Raw stored state for a subsystem
    #[inline]
    #[must_use]
    pub fn raw(&self, subsystem: &str) -> Option<&Value> {
        self.subsystems.get(subsystem)
    }

    pub(crate) fn set_raw(&mut self, subsystem: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.subsystems.insert(subsystem.to_string(), value);
            }
            None => {
                self.subsystems.shift_remove(subsystem);
            }
        }
    }

    /// Names of subsystems with stored (non-default) state
    pub fn stored_subsystems(&self) -> impl Iterator<Item = &str> {
        self.subsystems.keys().map(String::as_str)
    }

    pub(crate) fn raw_subsystems(&self) -> &IndexMap<String, Value> {
        &self.subsystems
    }

    /// Is this subsystem delegated to another configuration
    #[inline]
    #[must_use]
    pub fn is_linked(&self, subsystem: &str) -> bool {
        self.links.contains_key(subsystem)
    }

    /// Configuration this subsystem is linked to
    #[inline]
    #[must_use]
    pub fn link_target(&self, subsystem: &str) -> Option<ConfigId> {
        self.links.get(subsystem).copied()
    }

    /// All links
    #[inline]
    #[must_use]
    pub fn links(&self) -> &BTreeMap<String, ConfigId> {
        &self.links
    }

    pub(crate) fn set_link(&mut self, subsystem: &str, target: ConfigId) {
        self.links.insert(subsystem.to_string(), target);
    }

    pub(crate) fn clear_link(&mut self, subsystem: &str) -> bool {
        self.links.remove(subsystem).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::is_default_value;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Bingo {
        #[serde(default)]
        chaff: String,
    }

    impl SubsystemSetting for Bingo {
        const NAME: &'static str = "bingo";

        fn is_default(&self) -> bool {
            is_default_value(&self.chaff, "10")
        }
    }

    #[test]
    fn missing_setting_is_default() {
        let config = Configuration::new("A", "f16c");
        let bingo: Bingo = config.setting().unwrap();
        assert!(bingo.is_default());
    }

    #[test]
    fn set_and_get_setting() {
        let mut config = Configuration::new("A", "f16c");
        config
            .set_setting(&Bingo {
                chaff: "20".into(),
            })
            .unwrap();
        assert_eq!(config.setting::<Bingo>().unwrap().chaff, "20");
        assert_eq!(config.stored_subsystems().collect::<Vec<_>>(), vec!["bingo"]);
    }

    #[test]
    fn default_setting_is_not_stored() {
        let mut config = Configuration::new("A", "f16c");
        config
            .set_setting(&Bingo {
                chaff: "10".into(),
            })
            .unwrap();
        assert!(config.raw("bingo").is_none());
    }

    #[test]
    fn unreadable_setting_falls_back() {
        let mut config = Configuration::new("A", "f16c");
        config.set_raw("bingo", Some(serde_json::json!({"chaff": 12})));
        assert!(config.setting::<Bingo>().unwrap_err().is_data_error());
        assert_eq!(config.setting_or_default::<Bingo>(), Bingo::default());
    }

    #[test]
    fn linked_setting_cannot_be_edited() {
        let mut config = Configuration::new("A", "f16c");
        let other = ConfigId::new();
        config.set_link("bingo", other);
        let err = config
            .set_setting(&Bingo {
                chaff: "20".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::Linked { target, .. } if target == other));
    }

    #[test]
    fn seat_defaults_front() {
        let config = Configuration::new("A", "f15e");
        assert_eq!(config.seat(), CrewSeat::Front);
        assert_eq!(config.with_seat(CrewSeat::Rear).seat().to_string(), "rear");
    }
}
