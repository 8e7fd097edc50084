use dtc_config::{CrewSeat, SubsystemSetting};
use dtc_core::subsystems::cmds::CmdsSettings;
use dtc_core::subsystems::misc::MiscSettings;
use dtc_core::subsystems::radio::RadioSettings;
use dtc_core::subsystems::sms::{SmsSettings, StationProfile};
use dtc_core::{TargetKind, SETUP, TEARDOWN};
use dtc_script::{Instruction, TargetSnapshot};
use dtc_test_utils::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn fresh_f16c_configuration_is_setup_and_teardown_only() {
    let plan = plan(&f16c_config("Fresh"));

    let names: Vec<_> = plan.sections().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![SETUP, TEARDOWN]);
    assert!(matches!(
        &plan.section(SETUP)[0],
        Instruction::If { predicate, .. } if predicate.name() == "IsCockpitPowered"
    ));
    assert_eq!(
        invoked_in(plan.section(TEARDOWN)),
        vec!["INTL.MAL_IND_LTS"; 4]
    );
}

#[test]
fn fresh_f15e_configuration_checks_seat() {
    let plan = plan(&f15e_config("Fresh", CrewSeat::Rear));
    let setup = plan.section(SETUP);
    assert_eq!(setup.len(), 2);
    match &setup[1] {
        Instruction::If {
            predicate,
            expected,
            args,
            then,
        } => {
            assert_eq!(predicate.name(), "IsCrewSeat");
            assert_eq!(expected, "false");
            assert_eq!(args, &vec!["rear".to_string()]);
            assert!(matches!(then.as_slice(), [Instruction::Abort { .. }]));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        plan.section(TEARDOWN),
        [Instruction::CallFunction { name, .. }] if name == "FlashCaution"
    ));
    assert_eq!(plan.built_subsystems().count(), 0);
}

#[test]
fn teardown_feedback_follows_preference() {
    let quiet = quiet_orchestrator(TargetKind::F16C)
        .build(&f16c_config("Q"), &TargetSnapshot::new())
        .unwrap();
    assert!(quiet.section(TEARDOWN).is_empty());
    assert_eq!(count_ops(quiet.script(), "invoke"), 0);
}

#[test]
fn single_radio_field_invokes_only_radio_controls() {
    let config = with_setting(
        f15e_config("Radio", CrewSeat::Front),
        &radio_with_preset(1, "243.0"),
    );
    let plan = plan(&config);

    let radio = invoked_in(plan.section("radio"));
    assert_eq!(&radio[..3], &["UFC_FRONT.CLR", "UFC_FRONT.CLR", "UFC_FRONT.MENU"]);
    assert!(radio.iter().all(|c| c.starts_with("UFC_FRONT.")));

    let outside: Vec<_> = plan
        .sections()
        .iter()
        .filter(|s| s.name != "radio")
        .flat_map(|s| invoked_in(plan.section(&s.name)))
        .collect();
    assert!(outside.is_empty());
}

#[test]
fn single_misc_field_only_touches_tacan() {
    let config = with_setting(
        f16c_config("Tacan"),
        &MiscSettings {
            tacan_channel: "45".into(),
            ..MiscSettings::default()
        },
    );
    let plan = quiet_orchestrator(TargetKind::F16C)
        .build(&config, &TargetSnapshot::new())
        .unwrap();
    let controls = invoked(plan.script());
    assert_eq!(controls.len(), 4 + 4);
    assert!(controls.iter().all(|c| c.starts_with("TACAN.")));
}

#[test]
fn subsystems_follow_target_order() {
    let order: Vec<_> = TargetKind::F16C
        .definition()
        .unwrap()
        .subsystem_names()
        .collect();
    assert_eq!(order, vec!["misc", "radio", "cmds", "hts", "harm", "sms"]);

    let mut config = f16c_config("All");
    config
        .set_setting(&CmdsSettings {
            chaff_bingo: "20".into(),
            flare_bingo: String::new(),
        })
        .unwrap();
    config.set_setting(&radio_with_preset(2, "251")).unwrap();
    let plan = plan(&config);
    assert_eq!(plan.built_subsystems().collect::<Vec<_>>(), vec!["radio", "cmds"]);
}

#[test]
fn link_then_edit_leaves_owner_build_unchanged() {
    let radio = radio_with_preset(5, "264");
    let a = with_setting(f16c_config("A"), &radio);
    let b = with_setting(f16c_config("B"), &radio);
    let (mut store, ids) = store_with([a, b]);
    let orch = orchestrator(TargetKind::F16C);
    let snapshot = TargetSnapshot::new();

    let b_before = orch.build_in_store(&store, ids[1], &snapshot).unwrap();
    store.link(ids[0], RadioSettings::NAME, ids[1]).unwrap();

    let a_plan = orch.build_in_store(&store, ids[0], &snapshot).unwrap();
    assert!(a_plan.section("radio").is_empty());
    let b_after = orch.build_in_store(&store, ids[1], &snapshot).unwrap();
    assert_eq!(b_after, b_before);
}

#[test]
fn linked_subsystem_rejects_local_edits() {
    let (mut store, ids) = store_with([f16c_config("A"), f16c_config("B")]);
    store.link(ids[0], "radio", ids[1]).unwrap();
    let config = store.get_mut(ids[0]).unwrap();
    assert!(config.set_setting(&radio_with_preset(1, "300")).is_err());
}

#[test]
fn unreadable_state_falls_back_to_defaults() {
    let text = format!(
        r#"{{"format_version":2,"id":"{}","name":"Broken","target":"f16c",
            "subsystems":{{"cmds":{{"chaff_bingo":17}}}}}}"#,
        dtc_config::ConfigId::new()
    );
    let config = dtc_config::file::from_json(&text).unwrap();
    let plan = plan(&config);
    assert!(plan.section("cmds").is_empty());
}

#[test]
fn snapshot_queries_feed_sms_guard() {
    let config = with_setting(
        f16c_config("Loadout"),
        &SmsSettings {
            stations: BTreeMap::from([(
                4,
                StationProfile {
                    store: "AGM-65D".into(),
                    ripple: "2".into(),
                    fuze: String::new(),
                },
            )]),
        },
    );
    let orch = orchestrator(TargetKind::F16C);
    let queries = orch.required_queries(&config);
    assert_eq!(queries.len(), 1);

    let mismatch = TargetSnapshot::new().with(queries[0].key.clone(), "false");
    let plan = orch.build(&config, &mismatch).unwrap();
    assert!(matches!(plan.section("sms").last(), Some(Instruction::Abort { .. })));

    let matched = TargetSnapshot::new().with(queries[0].key.clone(), "true");
    let plan = orch.build(&config, &matched).unwrap();
    assert_eq!(count_ops(plan.script(), "abort"), 1); // power guard only
}
