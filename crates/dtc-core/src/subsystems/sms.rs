//! Stores management: per-station release profiles (F-16C)
//!
//! Profiles only make sense for the store actually loaded on a station.
//! Each configured station is checked against the pre-fetched snapshot:
//!
//! | snapshot answer | emitted |
//! |---|---|
//! | `true`  | profile entry only |
//! | `false` | `Abort`, station skipped |
//! | unknown | `If StationHasStore == false { Abort }`, then entry |

use super::{parse_in_range, F16C_LMFD, F16C_UFC};
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::relative::cycle_presses;
use dtc_config::{effective, is_default_value, SubsystemSetting};
use dtc_script::{ScriptBuilder, StateQuery};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Predicate answering whether a station carries a store
pub const STATION_HAS_STORE: &str = "StationHasStore";

/// Default ripple quantity
pub const DEFAULT_RIPPLE: &str = "1";

/// Fuze options in selector order; the first is the default
pub const FUZE_MODES: [&str; 3] = ["NSTL", "NOSE", "TAIL"];

/// Highest station number
pub const MAX_STATION: u8 = 9;

/// Release profile for one station
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationProfile {
    /// Store the profile is written for, e.g. `GBU-12`
    pub store: String,
    /// Ripple quantity
    pub ripple: String,
    /// Fuze option
    pub fuze: String,
}

impl StationProfile {
    /// Check if the profile leaves every release option at its default
    #[must_use]
    pub fn is_default(&self) -> bool {
        is_default_value(&self.ripple, DEFAULT_RIPPLE) && is_default_value(&self.fuze, FUZE_MODES[0])
    }
}

/// SMS settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsSettings {
    /// Station number to profile
    pub stations: BTreeMap<u8, StationProfile>,
}

impl SubsystemSetting for SmsSettings {
    const NAME: &'static str = "sms";

    fn is_default(&self) -> bool {
        self.stations.values().all(StationProfile::is_default)
    }
}

fn store_query(station: u8, store: &str) -> StateQuery {
    StateQuery::new(STATION_HAS_STORE, &[&station.to_string(), store])
}

/// Store checks needed for the configured stations
#[must_use]
pub fn queries(s: &SmsSettings) -> Vec<StateQuery> {
    s.stations
        .iter()
        .filter(|(_, profile)| !profile.is_default())
        .map(|(station, profile)| store_query(*station, &profile.store))
        .collect()
}

/// Append station profile entry on the left MFD
///
/// # Errors
/// Returns [`BuildError::InvalidSetting`] for unknown stations, empty store
/// names, ripple outside 1..=99 or unknown fuze options
pub fn build(
    s: &SmsSettings,
    ctx: &BuildContext<'_>,
    b: &mut ScriptBuilder,
) -> Result<(), BuildError> {
    let name = SmsSettings::NAME;
    let lmfd = |n: u32| ctx.control(F16C_LMFD, &format!("OSB_{n}"));

    // SMS format
    b.action(lmfd(12)?);

    for (station, profile) in s.stations.iter().filter(|(_, p)| !p.is_default()) {
        if *station == 0 || *station > MAX_STATION {
            return Err(BuildError::invalid(name, format!("unknown station {station}")));
        }
        if profile.store.is_empty() {
            return Err(BuildError::invalid(
                name,
                format!("station {station} has no store"),
            ));
        }
        let fuze = FUZE_MODES
            .iter()
            .position(|m| *m == effective(&profile.fuze, FUZE_MODES[0]))
            .ok_or_else(|| BuildError::invalid(name, format!("unknown fuze '{}'", profile.fuze)))?;

        let query = store_query(*station, &profile.store);
        let message = format!("Station {station} does not carry {}", profile.store);
        match ctx.snapshot().answer(&query) {
            Some("true") => {}
            Some(answer) => {
                tracing::warn!(station, store = %profile.store, answer, "loadout mismatch");
                b.abort(message);
                continue;
            }
            None => {
                let args: Vec<&str> = query.args.iter().map(String::as_str).collect();
                b.if_block(STATION_HAS_STORE, "false", &args, |b| {
                    b.abort(message);
                    Ok::<_, BuildError>(())
                })?;
            }
        }

        b.action(lmfd(u32::from(*station))?);
        if !is_default_value(&profile.ripple, DEFAULT_RIPPLE) {
            parse_in_range(name, "ripple", &profile.ripple, 1..=99)?;
            b.action(lmfd(18)?);
            ctx.keypad(b, F16C_UFC, &profile.ripple)?;
            b.action(ctx.control(F16C_UFC, "ENTR")?);
        }
        b.repeat(lmfd(19)?, cycle_presses(0, fuze, FUZE_MODES.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UploadSettings;
    use dtc_config::CrewSeat;
    use dtc_script::{Instruction, Script, TargetSnapshot};

    fn settings() -> SmsSettings {
        SmsSettings {
            stations: BTreeMap::from([(
                3,
                StationProfile {
                    store: "GBU-12".into(),
                    ripple: "2".into(),
                    fuze: "TAIL".into(),
                },
            )]),
        }
    }

    fn run(s: &SmsSettings, snapshot: &TargetSnapshot) -> Result<Script, BuildError> {
        let registry = dtc_registry::builtin("f16c")?;
        let upload = UploadSettings::default();
        let ctx = BuildContext::new(registry, snapshot, &upload, CrewSeat::Front)?;
        let mut b = ctx.builder();
        build(s, &ctx, &mut b)?;
        Ok(b.finish())
    }

    #[test]
    fn unknown_loadout_gets_runtime_guard() {
        let script = run(&settings(), &TargetSnapshot::new()).unwrap();
        match &script.instructions()[1] {
            Instruction::If {
                predicate,
                expected,
                args,
                then,
            } => {
                assert_eq!(predicate.name(), STATION_HAS_STORE);
                assert_eq!(expected, "false");
                assert_eq!(args, &["3", "GBU-12"]);
                assert!(matches!(then[0], Instruction::Abort { .. }));
            }
            other => panic!("expected guard, got {other:?}"),
        }
    }

    #[test]
    fn known_match_needs_no_guard() {
        let snapshot = TargetSnapshot::new().with("StationHasStore:3:GBU-12", "true");
        let script = run(&settings(), &snapshot).unwrap();
        assert!(script
            .instructions()
            .iter()
            .all(|i| matches!(i, Instruction::Invoke { .. })));
        // page, station, ripple, keypad, enter, fuze x2
        assert_eq!(script.len(), 7);
    }

    #[test]
    fn known_mismatch_aborts_without_programming() {
        let snapshot = TargetSnapshot::new().with("StationHasStore:3:GBU-12", "false");
        let script = run(&settings(), &snapshot).unwrap();
        assert_eq!(script.len(), 2);
        assert!(matches!(
            &script.instructions()[1],
            Instruction::Abort { message } if message == "Station 3 does not carry GBU-12"
        ));
    }

    #[test]
    fn queries_cover_configured_stations() {
        let q = queries(&settings());
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].key, "StationHasStore:3:GBU-12");
        assert!(queries(&SmsSettings::default()).is_empty());
    }
}
