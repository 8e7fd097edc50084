//! Static action tables
//!
//! Tables are YAML documents describing the devices and actions of one
//! target variant. The builtin tables ship inside the crate and are parsed
//! lazily, once per process.

use crate::error::RegistryError;
use crate::registry::ActionRegistry;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Parsed form of a static action table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryTable {
    /// Target variant identifier
    pub target: String,
    /// Settle delay applied to actions that do not set their own
    #[serde(default = "default_delay")]
    pub default_delay_ms: u32,
    /// Devices in table order
    pub devices: Vec<DeviceEntry>,
}

/// One device entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Device name
    pub name: String,
    /// Numeric device id
    pub id: u32,
    /// Actions on this device
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

/// One action entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// Action name, unique within the device
    pub name: String,
    /// Numeric action id
    pub id: u32,
    /// Per-action settle delay override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u32>,
    /// Position values; a push button has the single value `1.0`
    #[serde(default = "default_values")]
    pub values: Vec<f64>,
}

fn default_delay() -> u32 {
    50
}

fn default_values() -> Vec<f64> {
    vec![1.0]
}

impl RegistryTable {
    /// Parse a table from YAML
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidTable`] if the document is malformed
    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        serde_yaml::from_str(yaml).map_err(|e| RegistryError::InvalidTable {
            target: "<unparsed>".into(),
            reason: e.to_string(),
        })
    }

    /// Parse and build a registry in one step
    ///
    /// # Errors
    /// See [`RegistryTable::from_yaml`] and [`ActionRegistry::from_table`]
    pub fn load(yaml: &str) -> Result<ActionRegistry, RegistryError> {
        ActionRegistry::from_table(Self::from_yaml(yaml)?)
    }
}

static F16C: Lazy<Result<ActionRegistry, RegistryError>> =
    Lazy::new(|| RegistryTable::load(include_str!("../tables/f16c.yaml")));

static F15E: Lazy<Result<ActionRegistry, RegistryError>> =
    Lazy::new(|| RegistryTable::load(include_str!("../tables/f15e.yaml")));

/// Identifiers of the targets with a builtin table
#[must_use]
pub fn builtin_targets() -> &'static [&'static str] {
    &["f16c", "f15e"]
}

/// Builtin registry for a target variant
///
/// # Errors
/// Returns [`RegistryError::UnknownTarget`] for targets without a table, or
/// the table's load error if the embedded table is broken
pub fn builtin(target: &str) -> Result<&'static ActionRegistry, RegistryError> {
    let slot = match target {
        "f16c" => &F16C,
        "f15e" => &F15E,
        other => return Err(RegistryError::UnknownTarget(other.to_string())),
    };
    slot.as_ref().map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_load() {
        for target in builtin_targets() {
            let registry = builtin(target).unwrap();
            assert_eq!(registry.target(), *target);
            assert!(registry.control_count() > 0);
        }
    }

    #[test]
    fn builtin_unknown_target() {
        assert_eq!(
            builtin("a10c").unwrap_err(),
            RegistryError::UnknownTarget("a10c".into())
        );
    }

    #[test]
    fn builtin_is_shared() {
        let a = builtin("f16c").unwrap();
        let b = builtin("f16c").unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn yaml_defaults_apply() {
        let yaml = r"
target: mini
devices:
  - name: PANEL
    id: 3
    actions:
      - { name: PUSH, id: 10 }
      - { name: KNOB, id: 11, delay_ms: 200, values: [0.0, 0.25, 0.5] }
";
        let registry = RegistryTable::load(yaml).unwrap();
        let push = registry.lookup("PANEL", "PUSH").unwrap();
        assert_eq!(push.values(), &[1.0]);
        assert_eq!(push.delay_ms(), 50);
        let knob = registry.lookup("PANEL", "KNOB").unwrap();
        assert_eq!(knob.value(2).unwrap(), 0.5);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(RegistryTable::from_yaml("devices: [").is_err());
    }
}
