//! Action registry
//!
//! Built once per target variant from a [`RegistryTable`] and never mutated
//! afterwards.

use crate::control::{Control, Device};
use crate::error::RegistryError;
use crate::table::RegistryTable;
use indexmap::IndexMap;

/// Immutable catalogue of controls for one target variant
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRegistry {
    target: String,
    devices: IndexMap<String, Device>,
}

impl ActionRegistry {
    /// Build a registry from a parsed table
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidTable`] on duplicate device or action
    /// names, or on actions without any position value
    pub fn from_table(table: RegistryTable) -> Result<Self, RegistryError> {
        let target = table.target;
        let invalid = |reason: String| RegistryError::InvalidTable {
            target: target.clone(),
            reason,
        };

        let mut devices = IndexMap::with_capacity(table.devices.len());
        for entry in table.devices {
            if devices.contains_key(&entry.name) {
                return Err(invalid(format!("duplicate device '{}'", entry.name)));
            }
            let mut device = Device::new(entry.name.clone(), entry.id);
            for action in entry.actions {
                if action.values.is_empty() {
                    return Err(invalid(format!(
                        "action '{}.{}' has no values",
                        entry.name, action.name
                    )));
                }
                let control = Control::new(
                    action.name.clone(),
                    entry.name.clone(),
                    entry.id,
                    action.id,
                    action.delay_ms.unwrap_or(table.default_delay_ms),
                    action.values,
                );
                if !device.insert(control) {
                    return Err(invalid(format!(
                        "duplicate action '{}.{}'",
                        entry.name, action.name
                    )));
                }
            }
            devices.insert(entry.name, device);
        }

        tracing::debug!(target_variant = %target, devices = devices.len(), "action registry built");
        Ok(Self { target, devices })
    }

    /// Target variant this registry describes
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Look up a control by device and action name
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownDevice`] or [`RegistryError::NotFound`].
    /// Both indicate a builder bug and are logged at error level.
    pub fn lookup(&self, device: &str, action: &str) -> Result<&Control, RegistryError> {
        let Some(dev) = self.devices.get(device) else {
            tracing::error!(target_variant = %self.target, device, "unknown device");
            return Err(RegistryError::UnknownDevice {
                target: self.target.clone(),
                device: device.to_string(),
            });
        };
        dev.get(action).ok_or_else(|| {
            tracing::error!(target_variant = %self.target, device, action, "unknown action");
            RegistryError::NotFound {
                target: self.target.clone(),
                device: device.to_string(),
                action: action.to_string(),
            }
        })
    }

    /// Check if a control exists
    #[inline]
    #[must_use]
    pub fn contains(&self, device: &str, action: &str) -> bool {
        self.devices
            .get(device)
            .is_some_and(|d| d.get(action).is_some())
    }

    /// Device by name
    #[inline]
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Devices in table order
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Total number of controls across all devices
    #[must_use]
    pub fn control_count(&self) -> usize {
        self.devices.values().map(Device::len).sum()
    }
}
