//! Two-seat F-15E

use super::power_guard;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::subsystems::radio;
use crate::target::{Subsystem, SubsystemStage, TargetDefinition, TargetKind};
use dtc_config::CrewSeat;
use dtc_script::ScriptBuilder;

const SEATS: &[CrewSeat] = &[CrewSeat::Front, CrewSeat::Rear];

/// Predicate reporting whether the player occupies a given seat
pub const IS_CREW_SEAT: &str = "IsCrewSeat";

/// Remote routine flashing the master caution
pub const FLASH_CAUTION: &str = "FlashCaution";

fn setup(ctx: &BuildContext<'_>, b: &mut ScriptBuilder) -> Result<(), BuildError> {
    power_guard(b)?;
    let seat = ctx.seat();
    b.if_block(IS_CREW_SEAT, "false", &[seat.as_str()], |b| {
        b.abort(format!("Configuration is for the {seat} seat"));
        Ok::<_, BuildError>(())
    })?;
    Ok(())
}

fn teardown(ctx: &BuildContext<'_>, b: &mut ScriptBuilder) -> Result<(), BuildError> {
    if ctx.settings().flash_on_complete {
        b.call_function(FLASH_CAUTION, &["2"], None);
    }
    Ok(())
}

/// F-15E definition
///
/// # Errors
/// Returns [`BuildError::Registry`] if the built-in table fails to load
pub fn definition() -> Result<TargetDefinition, BuildError> {
    let kind = TargetKind::F15E;
    let subsystems: Vec<Box<dyn SubsystemStage>> = vec![Box::new(Subsystem::new(radio::build_f15e))];
    Ok(TargetDefinition::new(
        kind,
        dtc_registry::builtin(kind.as_str())?,
        SEATS,
        setup,
        teardown,
        subsystems,
    ))
}
