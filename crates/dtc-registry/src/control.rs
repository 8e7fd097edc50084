//! Controls and devices
//!
//! A [`Control`] is immutable once registered. Multi-position controls carry
//! one value per position; a plain push button carries a single value.

use crate::error::RegistryError;
use indexmap::IndexMap;

/// One manipulable element of the remote cockpit
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    name: String,
    device: String,
    device_id: u32,
    action_id: u32,
    delay_ms: u32,
    values: Vec<f64>,
}

impl Control {
    /// Create a control
    ///
    /// `values` must be non-empty; tables are checked for this on load.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        device: impl Into<String>,
        device_id: u32,
        action_id: u32,
        delay_ms: u32,
        values: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            device_id,
            action_id,
            delay_ms,
            values,
        }
    }

    /// Action name, unique within its device
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning device name
    #[inline]
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Numeric device identity
    #[inline]
    #[must_use]
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Numeric action identity
    #[inline]
    #[must_use]
    pub fn action_id(&self) -> u32 {
        self.action_id
    }

    /// Settle delay after actuation, in milliseconds
    #[inline]
    #[must_use]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// All position values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Is this a multi-position control
    #[inline]
    #[must_use]
    pub fn is_multi_position(&self) -> bool {
        self.values.len() > 1
    }

    /// Value for a position
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidPosition`] if `index` is out of range
    pub fn value(&self, index: usize) -> Result<f64, RegistryError> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| RegistryError::InvalidPosition {
                control: self.qualified_name(),
                index,
                available: self.values.len(),
            })
    }

    /// `DEVICE.ACTION` form used in logs and rendered scripts
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.device, self.name)
    }
}

/// A cockpit panel grouping controls that share a device id
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    name: String,
    id: u32,
    controls: IndexMap<String, Control>,
}

impl Device {
    pub(crate) fn new(name: String, id: u32) -> Self {
        Self {
            name,
            id,
            controls: IndexMap::new(),
        }
    }

    /// Insert a control; returns false if the name was already taken
    pub(crate) fn insert(&mut self, control: Control) -> bool {
        if self.controls.contains_key(control.name()) {
            return false;
        }
        self.controls.insert(control.name().to_string(), control);
        true
    }

    /// Device name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric device identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Control by action name
    #[inline]
    #[must_use]
    pub fn get(&self, action: &str) -> Option<&Control> {
        self.controls.get(action)
    }

    /// Controls in table order
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.controls.values()
    }

    /// Number of controls
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Check if the device has no controls
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knob() -> Control {
        Control::new("BAND", "TACAN", 46, 3006, 80, vec![0.0, 1.0])
    }

    #[test]
    fn control_value_in_range() {
        let control = knob();
        assert!(control.is_multi_position());
        assert_eq!(control.value(1).unwrap(), 1.0);
    }

    #[test]
    fn control_value_out_of_range() {
        let err = knob().value(2).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidPosition {
                control: "TACAN.BAND".into(),
                index: 2,
                available: 2,
            }
        );
    }

    #[test]
    fn device_rejects_duplicate_names() {
        let mut device = Device::new("TACAN".into(), 46);
        assert!(device.insert(knob()));
        assert!(!device.insert(knob()));
        assert_eq!(device.len(), 1);
    }
}
