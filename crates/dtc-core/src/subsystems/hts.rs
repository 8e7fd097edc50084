//! HARM targeting system: manual threat table and class filter (F-16C)
//!
//! The manual table defines the MAN threat class, which HARM tables may
//! reference, so this subsystem is built before `harm`.

use super::{F16C_LMFD, F16C_UFC};
use crate::context::BuildContext;
use crate::error::BuildError;
use dtc_config::SubsystemSetting;
use dtc_registry::Control;
use dtc_script::ScriptBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Entries in the manual threat table
pub const MANUAL_TABLE_SIZE: u32 = 8;

/// Number of threat classes on the HTS page
pub const THREAT_CLASSES: u8 = 11;

/// HTS settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtsSettings {
    /// Emitter codes forming the manual class, in table order
    pub manual_table: Vec<u16>,
    /// Threat classes switched off (1-based); all are on by default
    pub disabled_classes: BTreeSet<u8>,
}

impl SubsystemSetting for HtsSettings {
    const NAME: &'static str = "hts";

    fn is_default(&self) -> bool {
        self.manual_table.is_empty() && self.disabled_classes.is_empty()
    }
}

fn osb<'a>(ctx: &BuildContext<'a>, n: u32) -> Result<&'a Control, BuildError> {
    ctx.control(F16C_LMFD, &format!("OSB_{n}"))
}

/// Append manual table entry and class deselection on the left MFD
///
/// The manual table may already hold entries of unknown content; it is
/// emptied with a bounded delete loop before the new codes are typed.
///
/// # Errors
/// Returns [`BuildError::InvalidSetting`] for oversized tables, zero codes
/// or unknown classes
pub fn build(
    s: &HtsSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    let name = HtsSettings::NAME;
    if s.manual_table.len() > MANUAL_TABLE_SIZE as usize {
        return Err(BuildError::invalid(
            name,
            format!("manual table holds at most {MANUAL_TABLE_SIZE} codes"),
        ));
    }
    if let Some(class) = s
        .disabled_classes
        .iter()
        .find(|c| **c == 0 || **c > THREAT_CLASSES)
    {
        return Err(BuildError::invalid(name, format!("unknown threat class {class}")));
    }

    // HTS format
    b.action(osb(ctx, 14)?);

    if !s.manual_table.is_empty() {
        let delete = osb(ctx, 20)?;
        let enter = ctx.control(F16C_UFC, "ENTR")?;
        b.action(osb(ctx, 5)?);
        b.while_block_max("HtsManualTableEmpty", "false", &[], MANUAL_TABLE_SIZE, |b| {
            b.action(delete);
            Ok::<_, BuildError>(())
        })?;
        for code in &s.manual_table {
            if *code == 0 {
                return Err(BuildError::invalid(name, "emitter code 0"));
            }
            ctx.keypad(b, F16C_UFC, &code.to_string())?;
            b.action(enter);
        }
        b.action(osb(ctx, 5)?);
    }

    if !s.disabled_classes.is_empty() {
        b.action(osb(ctx, 4)?);
        for class in &s.disabled_classes {
            b.action(osb(ctx, 5 + u32::from(*class))?);
        }
        b.action(osb(ctx, 4)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UploadSettings;
    use dtc_config::CrewSeat;
    use dtc_script::{Instruction, TargetSnapshot};

    fn run(s: &HtsSettings) -> Result<dtc_script::Script, BuildError> {
        let registry = dtc_registry::builtin("f16c")?;
        let snapshot = TargetSnapshot::new();
        let settings = UploadSettings::default();
        let ctx = BuildContext::new(registry, &snapshot, &settings, CrewSeat::Front)?;
        let mut b = ctx.builder();
        build(s, &ctx, &mut b)?;
        Ok(b.finish())
    }

    #[test]
    fn manual_table_is_cleared_with_bounded_loop() {
        let script = run(&HtsSettings {
            manual_table: vec![126, 30],
            ..HtsSettings::default()
        })
        .unwrap();
        let bound = script.instructions().iter().find_map(|i| match i {
            Instruction::While { max_iterations, .. } => Some(max_iterations.get()),
            _ => None,
        });
        assert_eq!(bound, Some(MANUAL_TABLE_SIZE));
        assert_eq!(
            script
                .invocations()
                .filter(|i| i.control == "UFC.ENTR")
                .count(),
            2
        );
    }

    #[test]
    fn disabled_classes_toggle_their_buttons() {
        let script = run(&HtsSettings {
            disabled_classes: BTreeSet::from([1, 11]),
            ..HtsSettings::default()
        })
        .unwrap();
        let names: Vec<_> = script.invocations().map(|i| i.control.as_str()).collect();
        assert_eq!(
            names,
            vec!["LMFD.OSB_14", "LMFD.OSB_4", "LMFD.OSB_6", "LMFD.OSB_16", "LMFD.OSB_4"]
        );
    }

    #[test]
    fn rejects_unknown_class_and_oversized_table() {
        assert!(run(&HtsSettings {
            disabled_classes: BTreeSet::from([12]),
            ..HtsSettings::default()
        })
        .is_err());
        assert!(run(&HtsSettings {
            manual_table: vec![1; 9],
            ..HtsSettings::default()
        })
        .is_err());
    }
}
