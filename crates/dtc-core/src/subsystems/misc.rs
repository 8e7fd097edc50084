//! Miscellaneous F-16C settings: TACAN and fuel bingo

use super::{f16c_list_item, parse_in_range, F16C_UFC};
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::relative::drive_relative;
use dtc_config::{effective, is_default_value, SubsystemSetting};
use dtc_script::ScriptBuilder;
use serde::{Deserialize, Serialize};

/// Channel the TACAN thumbwheels rest on
pub const DEFAULT_TACAN_CHANNEL: &str = "1";
/// Default TACAN band
pub const DEFAULT_TACAN_BAND: &str = "X";
/// Default bingo fuel in pounds
pub const DEFAULT_BINGO: &str = "1500";

const TACAN: &str = "TACAN";

/// Miscellaneous settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscSettings {
    /// TACAN channel, 1 to 126
    pub tacan_channel: String,
    /// TACAN band, `X` or `Y`
    pub tacan_band: String,
    /// Bingo fuel in pounds
    pub bingo: String,
}

impl SubsystemSetting for MiscSettings {
    const NAME: &'static str = "misc";

    fn is_default(&self) -> bool {
        is_default_value(&self.tacan_channel, DEFAULT_TACAN_CHANNEL)
            && is_default_value(&self.tacan_band, DEFAULT_TACAN_BAND)
            && is_default_value(&self.bingo, DEFAULT_BINGO)
    }
}

/// Split a TACAN channel into tens and ones wheel positions
#[must_use]
pub fn tacan_wheels(channel: u32) -> (i64, i64) {
    (i64::from(channel / 10), i64::from(channel % 10))
}

/// Append TACAN and bingo entry
///
/// # Errors
/// Returns [`BuildError::InvalidSetting`] for out-of-range values
pub fn build(
    s: &MiscSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    if !is_default_value(&s.tacan_channel, DEFAULT_TACAN_CHANNEL) {
        let baseline = parse_in_range(MiscSettings::NAME, "tacan_channel", DEFAULT_TACAN_CHANNEL, 1..=126)?;
        let target = parse_in_range(MiscSettings::NAME, "tacan_channel", &s.tacan_channel, 1..=126)?;
        let (base_tens, base_ones) = tacan_wheels(baseline);
        let (tens, ones) = tacan_wheels(target);

        drive_relative(
            b,
            ctx.control(TACAN, "TENS_INC")?,
            ctx.control(TACAN, "TENS_DEC")?,
            base_tens,
            tens,
        );
        drive_relative(
            b,
            ctx.control(TACAN, "ONES_INC")?,
            ctx.control(TACAN, "ONES_DEC")?,
            base_ones,
            ones,
        );
    }

    if !is_default_value(&s.tacan_band, DEFAULT_TACAN_BAND) {
        let position = match effective(&s.tacan_band, DEFAULT_TACAN_BAND) {
            "X" => 0,
            "Y" => 1,
            other => {
                return Err(BuildError::invalid(
                    MiscSettings::NAME,
                    format!("tacan_band '{other}' is not X or Y"),
                ))
            }
        };
        b.action_at(ctx.control(TACAN, "BAND")?, position)?;
    }

    if !is_default_value(&s.bingo, DEFAULT_BINGO) {
        parse_in_range(MiscSettings::NAME, "bingo", &s.bingo, 0..=99_999)?;
        f16c_list_item(ctx, b, "2")?;
        ctx.keypad(b, F16C_UFC, &s.bingo)?;
        b.action(ctx.control(F16C_UFC, "ENTR")?);
        b.action(ctx.control(F16C_UFC, "RTN")?);
    }
    Ok(())
}
