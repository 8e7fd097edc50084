//! Single-seat F-16C

use super::power_guard;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::subsystems::{cmds, harm, hts, misc, radio, sms};
use crate::target::{Subsystem, SubsystemStage, TargetDefinition, TargetKind};
use dtc_config::CrewSeat;
use dtc_script::ScriptBuilder;

const SEATS: &[CrewSeat] = &[CrewSeat::Front];

/// Pause between caution light toggles
pub const FLASH_INTERVAL_MS: u32 = 300;

fn setup(_ctx: &BuildContext<'_>, b: &mut ScriptBuilder) -> Result<(), BuildError> {
    power_guard(b)
}

fn teardown(ctx: &BuildContext<'_>, b: &mut ScriptBuilder) -> Result<(), BuildError> {
    if !ctx.settings().flash_on_complete {
        return Ok(());
    }
    let light = ctx.control("INTL", "MAL_IND_LTS")?;
    for _ in 0..2 {
        b.action_at(light, 1)?.wait(FLASH_INTERVAL_MS);
        b.action_at(light, 0)?.wait(FLASH_INTERVAL_MS);
    }
    Ok(())
}

/// F-16C definition
///
/// `hts` precedes `harm`: HARM tables can reference the manual threat
/// class the HTS table defines.
///
/// # Errors
/// Returns [`BuildError::Registry`] if the built-in table fails to load
pub fn definition() -> Result<TargetDefinition, BuildError> {
    let kind = TargetKind::F16C;
    let subsystems: Vec<Box<dyn SubsystemStage>> = vec![
        Box::new(Subsystem::new(misc::build)),
        Box::new(Subsystem::new(radio::build_f16c)),
        Box::new(Subsystem::new(cmds::build)),
        Box::new(Subsystem::new(hts::build)),
        Box::new(Subsystem::new(harm::build)),
        Box::new(Subsystem::new(sms::build).with_queries(sms::queries)),
    ];
    Ok(TargetDefinition::new(
        kind,
        dtc_registry::builtin(kind.as_str())?,
        SEATS,
        setup,
        teardown,
        subsystems,
    ))
}
