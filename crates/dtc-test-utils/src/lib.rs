//! Testing utilities for the DTC workspace
//!
//! Shared configurations, orchestrators and script assertions.

#![allow(missing_docs)]

use dtc_config::{ConfigId, ConfigStore, Configuration, CrewSeat, SubsystemSetting};
use dtc_core::subsystems::radio::{RadioPresets, RadioSettings};
use dtc_core::{TargetKind, UploadOrchestrator, UploadPlan, UploadSettings};
use dtc_script::{Instruction, Script, TargetSnapshot};
use std::collections::BTreeMap;

pub fn f16c_config(name: &str) -> Configuration {
    Configuration::new(name, "f16c")
}

pub fn f15e_config(name: &str, seat: CrewSeat) -> Configuration {
    Configuration::new(name, "f15e").with_seat(seat)
}

pub fn with_setting<S: SubsystemSetting>(mut config: Configuration, setting: &S) -> Configuration {
    config.set_setting(setting).unwrap();
    config
}

pub fn radio_with_preset(channel: u8, freq: &str) -> RadioSettings {
    RadioSettings {
        com1: RadioPresets {
            presets: BTreeMap::from([(channel, freq.to_string())]),
            default_preset: String::new(),
        },
        com2: RadioPresets::default(),
    }
}

pub fn orchestrator(kind: TargetKind) -> UploadOrchestrator {
    UploadOrchestrator::new(kind, UploadSettings::default()).unwrap()
}

pub fn quiet_orchestrator(kind: TargetKind) -> UploadOrchestrator {
    let settings = UploadSettings {
        flash_on_complete: false,
        ..UploadSettings::default()
    };
    UploadOrchestrator::new(kind, settings).unwrap()
}

pub fn plan(config: &Configuration) -> UploadPlan {
    let kind = config.target().parse().unwrap();
    orchestrator(kind).build(config, &TargetSnapshot::new()).unwrap()
}

pub fn store_with(configs: impl IntoIterator<Item = Configuration>) -> (ConfigStore, Vec<ConfigId>) {
    let mut store = ConfigStore::new();
    let ids = configs
        .into_iter()
        .map(|c| store.insert(c).unwrap())
        .collect();
    (store, ids)
}

/// Qualified names of every invoked control, depth-first
pub fn invoked(script: &Script) -> Vec<String> {
    script.invocations().map(|i| i.control.clone()).collect()
}

/// Qualified names invoked by a list of instructions
pub fn invoked_in(instructions: &[Instruction]) -> Vec<String> {
    invoked(&Script::new(instructions.to_vec()))
}

pub fn count_ops(script: &Script, op: &str) -> usize {
    let mut count = 0;
    script.visit(|_, instruction| {
        if instruction.op() == op {
            count += 1;
        }
    });
    count
}
