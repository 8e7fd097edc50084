//! Subsystem settings
//!
//! Scalar fields are stored as strings. The empty string is the "inherit
//! default" sentinel; a value equal to the explicit default is also default
//! for upload purposes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Settings for one avionics subsystem
pub trait SubsystemSetting: Serialize + DeserializeOwned + Default + Clone + Debug {
    /// Subsystem name, used as the key in configurations, links and clipboard tags
    const NAME: &'static str;

    /// True iff every field equals its explicit default
    fn is_default(&self) -> bool;
}

/// Default check for one scalar field
#[inline]
#[must_use]
pub fn is_default_value(value: &str, default: &str) -> bool {
    value.is_empty() || value == default
}

/// Field value with the empty sentinel replaced by the explicit default
#[inline]
#[must_use]
pub fn effective<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}
