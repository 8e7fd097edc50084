//! Countermeasure dispenser bingo levels (F-16C)

use super::{f16c_list_item, parse_in_range, F16C_UFC};
use crate::context::BuildContext;
use crate::error::BuildError;
use dtc_config::{is_default_value, SubsystemSetting};
use dtc_script::ScriptBuilder;
use serde::{Deserialize, Serialize};

/// Default chaff bingo quantity
pub const DEFAULT_CHAFF_BINGO: &str = "10";
/// Default flare bingo quantity
pub const DEFAULT_FLARE_BINGO: &str = "10";

/// Countermeasure settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmdsSettings {
    /// Chaff remaining at which the low-chaff cue sounds
    pub chaff_bingo: String,
    /// Flares remaining at which the low-flare cue sounds
    pub flare_bingo: String,
}

impl SubsystemSetting for CmdsSettings {
    const NAME: &'static str = "cmds";

    fn is_default(&self) -> bool {
        is_default_value(&self.chaff_bingo, DEFAULT_CHAFF_BINGO)
            && is_default_value(&self.flare_bingo, DEFAULT_FLARE_BINGO)
    }
}

/// Append bingo entry on the CMDS DED page
///
/// The page opens on the chaff field; DOWN moves to flares.
///
/// # Errors
/// Returns [`BuildError::InvalidSetting`] for quantities outside 0..=99
pub fn build(
    s: &CmdsSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    let enter = ctx.control(F16C_UFC, "ENTR")?;
    f16c_list_item(ctx, b, "7")?;

    if !is_default_value(&s.chaff_bingo, DEFAULT_CHAFF_BINGO) {
        parse_in_range(CmdsSettings::NAME, "chaff_bingo", &s.chaff_bingo, 0..=99)?;
        ctx.keypad(b, F16C_UFC, &s.chaff_bingo)?;
        b.action(enter);
    }
    if !is_default_value(&s.flare_bingo, DEFAULT_FLARE_BINGO) {
        parse_in_range(CmdsSettings::NAME, "flare_bingo", &s.flare_bingo, 0..=99)?;
        b.action(ctx.control(F16C_UFC, "DOWN")?);
        ctx.keypad(b, F16C_UFC, &s.flare_bingo)?;
        b.action(enter);
    }
    b.action(ctx.control(F16C_UFC, "RTN")?);
    Ok(())
}
