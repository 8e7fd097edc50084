//! Tagged single-subsystem clipboard payloads

use crate::error::ConfigError;
use crate::setting::SubsystemSetting;
use serde_json::Value;

/// Leading marker of every payload
pub const CLIPBOARD_PREFIX: &str = "DTC/";

/// A subsystem's serialized settings tagged with the subsystem name
///
/// Text form is `DTC/<tag>` on the first line followed by the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardPayload {
    tag: String,
    body: Value,
}

impl ClipboardPayload {
    /// Wrap a typed setting
    ///
    /// # Errors
    /// Returns [`ConfigError::Serialization`] if the setting cannot be encoded
    pub fn from_setting<S: SubsystemSetting>(setting: &S) -> Result<Self, ConfigError> {
        Ok(Self {
            tag: S::NAME.to_string(),
            body: serde_json::to_value(setting)?,
        })
    }

    /// Parse clipboard text
    ///
    /// # Errors
    /// Returns [`ConfigError::NotAPayload`] if the text lacks the tag line,
    /// or [`ConfigError::Serialization`] if the body is not JSON
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let rest = text
            .strip_prefix(CLIPBOARD_PREFIX)
            .ok_or(ConfigError::NotAPayload)?;
        let (tag, body) = rest.split_once('\n').ok_or(ConfigError::NotAPayload)?;
        let tag = tag.trim_end_matches('\r');
        if tag.is_empty() {
            return Err(ConfigError::NotAPayload);
        }
        Ok(Self {
            tag: tag.to_string(),
            body: serde_json::from_str(body)?,
        })
    }

    /// Parse clipboard text, accepting only payloads tagged `expected`
    ///
    /// # Errors
    /// Returns [`ConfigError::ClipboardMismatch`] for a different tag, otherwise
    /// see [`ClipboardPayload::parse`]
    pub fn decode_expect(text: &str, expected: &str) -> Result<Self, ConfigError> {
        let payload = Self::parse(text)?;
        if payload.tag != expected {
            return Err(ConfigError::ClipboardMismatch {
                expected: expected.to_string(),
                found: payload.tag,
            });
        }
        Ok(payload)
    }

    /// Subsystem tag
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Serialized settings
    #[inline]
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Render as clipboard text
    ///
    /// # Errors
    /// Returns [`ConfigError::Serialization`] if the body cannot be encoded
    pub fn to_text(&self) -> Result<String, ConfigError> {
        Ok(format!(
            "{CLIPBOARD_PREFIX}{}\n{}",
            self.tag,
            serde_json::to_string(&self.body)?
        ))
    }

    /// Decode into a typed setting, checking the tag
    ///
    /// # Errors
    /// Returns [`ConfigError::ClipboardMismatch`] if the payload belongs to
    /// another subsystem, or [`ConfigError::Subsystem`] if the body does not
    /// decode
    pub fn into_setting<S: SubsystemSetting>(self) -> Result<S, ConfigError> {
        if self.tag != S::NAME {
            return Err(ConfigError::ClipboardMismatch {
                expected: S::NAME.to_string(),
                found: self.tag,
            });
        }
        serde_json::from_value(self.body).map_err(|source| ConfigError::Subsystem {
            subsystem: S::NAME.to_string(),
            source,
        })
    }
}
