//! Radio presets
//!
//! One builder serves every target. Targets differ only in their
//! [`RadioLayout`]: which keypad device to use, how to clear the display
//! before entry, and which keys open and commit each radio's page.

use super::parse_in_range;
use crate::context::BuildContext;
use crate::error::BuildError;
use dtc_config::{effective, is_default_value, CrewSeat, SubsystemSetting};
use dtc_script::ScriptBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Preset selected when nothing else is configured
pub const DEFAULT_PRESET: &str = "1";

/// Highest preset channel
pub const MAX_PRESET: u8 = 20;

/// Presets of one radio
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioPresets {
    /// Preset channel to frequency, e.g. `3 -> "305.000"`
    pub presets: BTreeMap<u8, String>,
    /// Preset selected after entry
    pub default_preset: String,
}

impl RadioPresets {
    /// Check if nothing differs from the defaults
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.presets.is_empty() && is_default_value(&self.default_preset, DEFAULT_PRESET)
    }
}

/// Radio settings for both radios
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioSettings {
    /// Primary radio
    pub com1: RadioPresets,
    /// Secondary radio
    pub com2: RadioPresets,
}

impl SubsystemSetting for RadioSettings {
    const NAME: &'static str = "radio";

    fn is_default(&self) -> bool {
        self.com1.is_default() && self.com2.is_default()
    }
}

/// Keys serving one radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioKeys {
    /// Opens the radio's entry page
    pub page: &'static str,
    /// Commits a typed channel or frequency
    pub select: &'static str,
}

/// Where a target's radio entry lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioLayout {
    /// Keypad device
    pub device: &'static str,
    /// Keys pressed before entry to leave any half-typed scratchpad
    pub clear: &'static [&'static str],
    /// Primary radio keys
    pub com1: RadioKeys,
    /// Secondary radio keys
    pub com2: RadioKeys,
    /// Whether the keypad has a decimal key
    pub decimal: bool,
    /// Predicate confirming the entry page is up, with the seat as argument
    pub page_shown: Option<&'static str>,
}

/// F-16C radio entry on the ICP
pub const F16C_LAYOUT: RadioLayout = RadioLayout {
    device: "UFC",
    clear: &["RTN", "RTN"],
    com1: RadioKeys {
        page: "COM1",
        select: "ENTR",
    },
    com2: RadioKeys {
        page: "COM2",
        select: "ENTR",
    },
    decimal: false,
    page_shown: None,
};

/// F-15E radio entry on the seat's upfront controller
#[must_use]
pub fn f15e_layout(seat: CrewSeat) -> RadioLayout {
    RadioLayout {
        device: match seat {
            CrewSeat::Front => "UFC_FRONT",
            CrewSeat::Rear => "UFC_REAR",
        },
        clear: &["CLR", "CLR"],
        com1: RadioKeys {
            page: "MENU",
            select: "PB1",
        },
        com2: RadioKeys {
            page: "MENU",
            select: "PB10",
        },
        decimal: true,
        page_shown: Some("IsUfcMenuShown"),
    }
}

fn frequency_text(subsystem: &str, freq: &str, decimal: bool) -> Result<String, BuildError> {
    let valid = !freq.is_empty()
        && freq.chars().all(|c| c.is_ascii_digit() || c == '.')
        && freq.chars().filter(|c| *c == '.').count() <= 1;
    if !valid {
        return Err(BuildError::invalid(
            subsystem,
            format!("frequency '{freq}' is not numeric"),
        ));
    }
    Ok(if decimal {
        freq.to_string()
    } else {
        freq.replace('.', "")
    })
}

fn build_radio(
    presets: &RadioPresets,
    keys: RadioKeys,
    layout: &RadioLayout,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    let name = RadioSettings::NAME;
    let select = ctx.control(layout.device, keys.select)?;
    let page = ctx.control(layout.device, keys.page)?;

    for key in layout.clear {
        b.action(ctx.control(layout.device, key)?);
    }
    b.action(page);
    if let Some(predicate) = layout.page_shown {
        b.while_block(predicate, "false", &[ctx.seat().as_str()], |b| {
            b.action(page);
            Ok::<_, BuildError>(())
        })?;
    }

    for (channel, freq) in &presets.presets {
        if *channel == 0 || *channel > MAX_PRESET {
            return Err(BuildError::invalid(
                name,
                format!("preset {channel} outside 1..={MAX_PRESET}"),
            ));
        }
        ctx.keypad(b, layout.device, &channel.to_string())?;
        b.action(select);
        ctx.keypad(b, layout.device, &frequency_text(name, freq, layout.decimal)?)?;
        b.action(select);
    }

    if !is_default_value(&presets.default_preset, DEFAULT_PRESET) {
        let preset = effective(&presets.default_preset, DEFAULT_PRESET);
        parse_in_range(name, "default_preset", preset, 1..=u32::from(MAX_PRESET))?;
        ctx.keypad(b, layout.device, preset)?;
        b.action(select);
    }
    Ok(())
}

/// Append preset entry for every non-default radio
///
/// # Errors
/// Returns [`BuildError::InvalidSetting`] for channels or frequencies the
/// keypad cannot express
pub fn build(
    s: &RadioSettings,
    layout: &RadioLayout,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    for (presets, keys) in [(&s.com1, layout.com1), (&s.com2, layout.com2)] {
        if !presets.is_default() {
            build_radio(presets, keys, layout, ctx, b)?;
        }
    }
    Ok(())
}

/// Radio builder for the F-16C
///
/// # Errors
/// See [`build`]
pub fn build_f16c(
    s: &RadioSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    build(s, &F16C_LAYOUT, ctx, b)
}

/// Radio builder for the F-15E, on the configuration's seat
///
/// # Errors
/// See [`build`]
pub fn build_f15e(
    s: &RadioSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    build(s, &f15e_layout(ctx.seat()), ctx, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UploadSettings;
    use dtc_script::{Instruction, Script, TargetSnapshot};

    fn run(target: &str, seat: CrewSeat, s: &RadioSettings) -> Result<Script, BuildError> {
        let registry = dtc_registry::builtin(target)?;
        let snapshot = TargetSnapshot::new();
        let settings = UploadSettings::default();
        let ctx = BuildContext::new(registry, &snapshot, &settings, seat)?;
        let mut b = ctx.builder();
        if target == "f16c" {
            build_f16c(s, &ctx, &mut b)?;
        } else {
            build_f15e(s, &ctx, &mut b)?;
        }
        Ok(b.finish())
    }

    fn one_preset(channel: u8, freq: &str) -> RadioSettings {
        RadioSettings {
            com1: RadioPresets {
                presets: BTreeMap::from([(channel, freq.to_string())]),
                default_preset: String::new(),
            },
            com2: RadioPresets::default(),
        }
    }

    #[test]
    fn f15e_entry_is_bracketed_by_clear_and_menu() {
        let script = run("f15e", CrewSeat::Front, &one_preset(2, "251.0")).unwrap();
        let names: Vec<_> = script.invocations().map(|i| i.control.as_str()).collect();
        assert_eq!(
            &names[..3],
            &["UFC_FRONT.CLR", "UFC_FRONT.CLR", "UFC_FRONT.MENU"]
        );
        assert!(matches!(script.instructions()[3], Instruction::While { .. }));
        assert_eq!(
            &names[4..],
            &[
                "UFC_FRONT.2",
                "UFC_FRONT.PB1",
                "UFC_FRONT.2",
                "UFC_FRONT.5",
                "UFC_FRONT.1",
                "UFC_FRONT..",
                "UFC_FRONT.0",
                "UFC_FRONT.PB1"
            ]
        );
    }

    #[test]
    fn rear_seat_uses_rear_controller() {
        let script = run("f15e", CrewSeat::Rear, &one_preset(1, "300")).unwrap();
        assert!(script
            .invocations()
            .all(|i| i.control.starts_with("UFC_REAR.")));
    }

    #[test]
    fn f16c_strips_decimal_point() {
        let script = run("f16c", CrewSeat::Front, &one_preset(4, "305.5")).unwrap();
        let names: Vec<_> = script.invocations().map(|i| i.control.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "UFC.RTN", "UFC.RTN", "UFC.COM1", "UFC.4", "UFC.ENTR", "UFC.3", "UFC.0", "UFC.5",
                "UFC.5", "UFC.ENTR"
            ]
        );
    }

    #[test]
    fn default_radio_is_skipped() {
        let settings = RadioSettings {
            com1: RadioPresets::default(),
            com2: RadioPresets {
                presets: BTreeMap::new(),
                default_preset: "3".into(),
            },
        };
        let script = run("f16c", CrewSeat::Front, &settings).unwrap();
        let names: Vec<_> = script.invocations().map(|i| i.control.as_str()).collect();
        assert_eq!(names, vec!["UFC.RTN", "UFC.RTN", "UFC.COM2", "UFC.3", "UFC.ENTR"]);
    }

    #[test]
    fn rejects_bad_preset() {
        assert!(run("f16c", CrewSeat::Front, &one_preset(21, "300")).is_err());
        assert!(run("f16c", CrewSeat::Front, &one_preset(1, "3x0")).is_err());
    }
}
