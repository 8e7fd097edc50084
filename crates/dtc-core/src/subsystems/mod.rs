//! Per-subsystem settings and builders
//!
//! Each module pairs a [`SubsystemSetting`](dtc_config::SubsystemSetting)
//! type with a pure builder function. Builders only see non-default,
//! unlinked settings; the [`Subsystem`](crate::Subsystem) adapter filters
//! the rest out.

pub mod cmds;
pub mod harm;
pub mod hts;
pub mod misc;
pub mod radio;
pub mod sms;

use crate::context::BuildContext;
use crate::error::BuildError;
use dtc_script::ScriptBuilder;

/// Upfront controller device on the F-16C
pub(crate) const F16C_UFC: &str = "UFC";

/// Left multifunction display on the F-16C
pub(crate) const F16C_LMFD: &str = "LMFD";

/// Open a numbered item of the F-16C LIST page from any DED page
pub(crate) fn f16c_list_item(
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
    item: &str,
) -> Result<(), BuildError> {
    let rtn = ctx.control(F16C_UFC, "RTN")?;
    b.action(rtn).action(rtn).action(ctx.control(F16C_UFC, "LIST")?);
    b.action(ctx.control(F16C_UFC, item)?);
    Ok(())
}

/// Parse a numeric field, rejecting values outside `range`
pub(crate) fn parse_in_range(
    subsystem: &str,
    field: &str,
    value: &str,
    range: std::ops::RangeInclusive<u32>,
) -> Result<u32, BuildError> {
    value
        .parse::<u32>()
        .ok()
        .filter(|v| range.contains(v))
        .ok_or_else(|| {
            BuildError::invalid(
                subsystem,
                format!(
                    "{field} '{value}' outside {}..={}",
                    range.start(),
                    range.end()
                ),
            )
        })
}
