//! HARM alternate launch tables (F-16C)

use super::{f16c_list_item, F16C_UFC};
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::relative::cycle_presses;
use dtc_config::SubsystemSetting;
use dtc_script::ScriptBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of HARM tables
pub const TABLES: u8 = 3;

/// Emitter slots per table
pub const SLOTS: usize = 5;

/// HARM settings
///
/// Only tables that differ from the aircraft defaults are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmSettings {
    /// Table number (1-based) to emitter codes in slot order
    pub tables: BTreeMap<u8, Vec<u16>>,
}

impl SubsystemSetting for HarmSettings {
    const NAME: &'static str = "harm";

    fn is_default(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Append table entry on the HARM DED page
///
/// The page opens on table 1; SEQ steps to the next table and wraps.
///
/// # Errors
/// Returns [`BuildError::InvalidSetting`] for unknown tables or more codes
/// than slots
pub fn build(
    s: &HarmSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    let name = HarmSettings::NAME;
    let seq = ctx.control(F16C_UFC, "SEQ")?;
    let enter = ctx.control(F16C_UFC, "ENTR")?;
    let down = ctx.control(F16C_UFC, "DOWN")?;

    f16c_list_item(ctx, b, "0")?;
    b.action(ctx.control(F16C_UFC, "4")?);

    let mut current = 0usize;
    for (table, codes) in &s.tables {
        if *table == 0 || *table > TABLES {
            return Err(BuildError::invalid(name, format!("unknown table {table}")));
        }
        if codes.len() > SLOTS {
            return Err(BuildError::invalid(
                name,
                format!("table {table} holds at most {SLOTS} codes"),
            ));
        }
        let index = usize::from(*table - 1);
        b.repeat(seq, cycle_presses(current, index, usize::from(TABLES)));
        current = index;

        for code in codes {
            ctx.keypad(b, F16C_UFC, &code.to_string())?;
            b.action(enter).action(down);
        }
    }
    b.action(ctx.control(F16C_UFC, "RTN")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UploadSettings;
    use dtc_config::CrewSeat;
    use dtc_script::TargetSnapshot;

    fn run(s: &HarmSettings) -> Result<dtc_script::Script, BuildError> {
        let registry = dtc_registry::builtin("f16c")?;
        let snapshot = TargetSnapshot::new();
        let settings = UploadSettings::default();
        let ctx = BuildContext::new(registry, &snapshot, &settings, CrewSeat::Front)?;
        let mut b = ctx.builder();
        build(s, &ctx, &mut b)?;
        Ok(b.finish())
    }

    #[test]
    fn steps_to_each_table() {
        let script = run(&HarmSettings {
            tables: BTreeMap::from([(1, vec![1]), (3, vec![2])]),
        })
        .unwrap();
        let seq = script
            .invocations()
            .filter(|i| i.control == "UFC.SEQ")
            .count();
        assert_eq!(seq, 2);
    }

    #[test]
    fn rejects_overfull_table() {
        assert!(run(&HarmSettings {
            tables: BTreeMap::from([(2, vec![1; 6])]),
        })
        .is_err());
        assert!(run(&HarmSettings {
            tables: BTreeMap::from([(4, vec![1])]),
        })
        .is_err());
    }
}
