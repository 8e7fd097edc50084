use dtc_config::{ConfigError, ConfigStore, Configuration, LinkError, MAX_LINK_HOPS};
use proptest::prelude::*;

const SUBSYSTEMS: [&str; 2] = ["radio", "cmds"];

fn store(n: usize) -> (ConfigStore, Vec<dtc_config::ConfigId>) {
    let mut store = ConfigStore::new();
    let ids = (0..n)
        .map(|i| store.insert(Configuration::new(format!("cfg-{i}"), "f16c")).unwrap())
        .collect();
    (store, ids)
}

fn reaches(store: &ConfigStore, from: dtc_config::ConfigId, subsystem: &str) -> bool {
    let mut current = from;
    for _ in 0..=MAX_LINK_HOPS + 1 {
        match store.get(current).and_then(|c| c.link_target(subsystem)) {
            Some(next) if next == from => return true,
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

proptest! {
    #[test]
    fn random_links_never_form_cycles(
        edges in proptest::collection::vec((0usize..8, 0usize..2, 0usize..8), 0..64)
    ) {
        let (mut store, ids) = store(8);

        for (from, sub, to) in edges {
            let subsystem = SUBSYSTEMS[sub];
            let before: Vec<_> = store.iter().map(|c| c.links().clone()).collect();

            match store.link(ids[from], subsystem, ids[to]) {
                Ok(()) => {
                    prop_assert_ne!(from, to);
                    prop_assert_eq!(store.get(ids[from]).unwrap().link_target(subsystem), Some(ids[to]));
                }
                Err(err) => {
                    prop_assert!(err.is_link_error());
                    let after: Vec<_> = store.iter().map(|c| c.links().clone()).collect();
                    prop_assert_eq!(before, after);
                }
            }

            for id in &ids {
                for subsystem in SUBSYSTEMS {
                    prop_assert!(!reaches(&store, *id, subsystem));
                    prop_assert!(store.resolve(*id, subsystem).is_ok());
                }
            }
        }
    }

    #[test]
    fn resolution_ends_at_unlinked_owner(chain in 1usize..8) {
        let (mut store, ids) = store(chain + 1);
        for pair in ids.windows(2) {
            store.link(pair[0], "radio", pair[1]).unwrap();
        }
        for id in &ids {
            let owner = store.resolve(*id, "radio").unwrap().owner;
            prop_assert_eq!(owner, ids[chain]);
            prop_assert!(!store.get(owner).unwrap().is_linked("radio"));
        }
    }
}

#[test]
fn joining_chains_respects_hop_limit() {
    let half = MAX_LINK_HOPS / 2;
    let (mut store, ids) = store(2 * (half + 1));
    let (head, tail) = ids.split_at(half + 1);
    for chain in [head, tail] {
        for pair in chain.windows(2) {
            store.link(pair[0], "radio", pair[1]).unwrap();
        }
    }
    let before: Vec<_> = store.iter().map(|c| c.links().clone()).collect();

    let err = store.link(head[half], "radio", tail[0]).unwrap_err();
    assert!(matches!(err, ConfigError::Link(LinkError::TooDeep { .. })));
    let after: Vec<_> = store.iter().map(|c| c.links().clone()).collect();
    assert_eq!(before, after);
    assert_eq!(store.resolve(head[0], "radio").unwrap().owner, head[half]);

    // one hop shorter upstream fits exactly
    store.unlink(head[0], "radio").unwrap();
    store.link(head[half], "radio", tail[0]).unwrap();
    assert_eq!(store.resolve(head[1], "radio").unwrap().owner, tail[half]);
}

#[test]
fn self_link_is_rejected() {
    let (mut store, ids) = store(1);
    let err = store.link(ids[0], "radio", ids[0]).unwrap_err();
    assert!(matches!(err, ConfigError::Link(LinkError::SelfLink { .. })));
}

#[test]
fn removing_middle_of_chain_keeps_resolution() {
    let (mut store, ids) = store(3);
    store.link(ids[0], "radio", ids[1]).unwrap();
    store.link(ids[1], "radio", ids[2]).unwrap();

    store.remove(ids[1]).unwrap();
    assert_eq!(store.resolve(ids[0], "radio").unwrap().owner, ids[2]);
    assert_eq!(store.len(), 2);
}
