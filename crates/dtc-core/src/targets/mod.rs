//! Built-in target definitions

pub mod f15e;
pub mod f16c;

use crate::error::BuildError;
use dtc_script::ScriptBuilder;

/// Predicate reporting whether the cockpit has electrical power
pub const IS_COCKPIT_POWERED: &str = "IsCockpitPowered";

/// Refuse to type into an unpowered cockpit
pub(crate) fn power_guard(b: &mut ScriptBuilder) -> Result<(), BuildError> {
    b.if_block(IS_COCKPIT_POWERED, "false", &[], |b| {
        b.abort("Cockpit is not powered");
        Ok::<_, BuildError>(())
    })?;
    Ok(())
}
