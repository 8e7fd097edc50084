//! Configuration store and link model
//!
//! Link acyclicity is enforced in exactly one place: [`ConfigStore::link`]
//! walks the existing chain before accepting a new link. Resolution follows
//! chains without re-checking, bounded by [`MAX_LINK_HOPS`].

use crate::configuration::Configuration;
use crate::error::{ConfigError, LinkError};
use crate::id::ConfigId;
use crate::setting::SubsystemSetting;
use indexmap::IndexMap;
use serde_json::Value;

/// Longest link chain accepted or followed
pub const MAX_LINK_HOPS: usize = 16;

/// Result of resolving a subsystem through its link chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    /// Terminal (unlinked) configuration owning the settings
    pub owner: ConfigId,
    /// Stored settings of the owner; `None` means defaults
    pub settings: Option<&'a Value>,
}

/// Owns configurations and the links between them
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    configs: IndexMap<ConfigId, Configuration>,
}

impl ConfigStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::DuplicateConfig`] if the id is already present
    pub fn insert(&mut self, config: Configuration) -> Result<ConfigId, ConfigError> {
        let id = config.id();
        if self.configs.contains_key(&id) {
            return Err(ConfigError::DuplicateConfig(id));
        }
        self.configs.insert(id, config);
        Ok(id)
    }

    /// Configuration by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: ConfigId) -> Option<&Configuration> {
        self.configs.get(&id)
    }

    /// Mutable configuration by id
    #[inline]
    pub fn get_mut(&mut self, id: ConfigId) -> Option<&mut Configuration> {
        self.configs.get_mut(&id)
    }

    fn require(&self, id: ConfigId) -> Result<&Configuration, ConfigError> {
        self.configs.get(&id).ok_or(ConfigError::UnknownConfig(id))
    }

    /// Number of configurations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Configurations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.configs.values()
    }

    /// Link `subsystem` of `from` to configuration `to`
    ///
    /// Walks the chain starting at `to`; the link is rejected if the chain
    /// reaches `from`, or if the longest chain through the new link,
    /// counting configurations already linked into `from`, would exceed
    /// [`MAX_LINK_HOPS`]. On rejection the link map is unchanged.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownConfig`] for missing configurations or
    /// [`ConfigError::Link`] for self links, cycles, overlong chains and
    /// target mismatches
    pub fn link(&mut self, from: ConfigId, subsystem: &str, to: ConfigId) -> Result<(), ConfigError> {
        let source = self.require(from)?;
        let dest = self.require(to)?;

        if from == to {
            return Err(LinkError::SelfLink {
                subsystem: subsystem.to_string(),
            }
            .into());
        }
        if source.target() != dest.target() {
            return Err(LinkError::TargetMismatch {
                from_target: source.target().to_string(),
                to_target: dest.target().to_string(),
            }
            .into());
        }

        let mut path = vec![from, to];
        let mut current = to;
        let mut hops = 0;
        while let Some(next) = self
            .configs
            .get(&current)
            .ok_or(LinkError::Dangling(current))?
            .link_target(subsystem)
        {
            path.push(next);
            if next == from {
                tracing::warn!(%from, %to, subsystem, "rejected cyclic link");
                return Err(LinkError::Cycle {
                    subsystem: subsystem.to_string(),
                    path,
                }
                .into());
            }
            hops += 1;
            if hops >= MAX_LINK_HOPS {
                return Err(LinkError::TooDeep {
                    subsystem: subsystem.to_string(),
                    max_hops: MAX_LINK_HOPS,
                }
                .into());
            }
            current = next;
        }

        let upstream = self.upstream_depth(from, subsystem);
        if upstream + 1 + hops > MAX_LINK_HOPS {
            tracing::warn!(%from, %to, subsystem, upstream, downstream = hops, "rejected overlong link chain");
            return Err(LinkError::TooDeep {
                subsystem: subsystem.to_string(),
                max_hops: MAX_LINK_HOPS,
            }
            .into());
        }

        if let Some(config) = self.configs.get_mut(&from) {
            config.set_link(subsystem, to);
        }
        tracing::debug!(%from, %to, subsystem, "linked");
        Ok(())
    }

    /// Longest chain of `subsystem` links ending at `id`
    fn upstream_depth(&self, id: ConfigId, subsystem: &str) -> usize {
        let mut depth = 0;
        let mut frontier = vec![id];
        while depth <= MAX_LINK_HOPS {
            frontier = self
                .configs
                .values()
                .filter(|c| c.link_target(subsystem).is_some_and(|t| frontier.contains(&t)))
                .map(Configuration::id)
                .collect();
            if frontier.is_empty() {
                break;
            }
            depth += 1;
        }
        depth
    }

    /// Remove a link; returns false if there was none
    ///
    /// The subsystem reverts to the configuration's own stored settings.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownConfig`] if `from` is missing
    pub fn unlink(&mut self, from: ConfigId, subsystem: &str) -> Result<bool, ConfigError> {
        let config = self
            .configs
            .get_mut(&from)
            .ok_or(ConfigError::UnknownConfig(from))?;
        Ok(config.clear_link(subsystem))
    }

    /// Follow `subsystem`'s links from `id` to the terminal owner
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownConfig`] if `id` is missing, or
    /// [`ConfigError::Link`] for dangling or overlong chains
    pub fn resolve(&self, id: ConfigId, subsystem: &str) -> Result<Resolved<'_>, ConfigError> {
        let mut current = self.require(id)?;
        for _ in 0..=MAX_LINK_HOPS {
            match current.link_target(subsystem) {
                None => {
                    return Ok(Resolved {
                        owner: current.id(),
                        settings: current.raw(subsystem),
                    })
                }
                Some(next) => {
                    current = self
                        .configs
                        .get(&next)
                        .ok_or(LinkError::Dangling(next))?;
                }
            }
        }
        Err(LinkError::TooDeep {
            subsystem: subsystem.to_string(),
            max_hops: MAX_LINK_HOPS,
        }
        .into())
    }

    /// Resolve and decode a subsystem's effective settings
    ///
    /// # Errors
    /// See [`ConfigStore::resolve`]; also [`ConfigError::Subsystem`] if the
    /// owner's entry is unreadable
    pub fn resolve_setting<S: SubsystemSetting>(
        &self,
        id: ConfigId,
    ) -> Result<(ConfigId, S), ConfigError> {
        let resolved = self.resolve(id, S::NAME)?;
        let settings = match resolved.settings {
            None => S::default(),
            Some(raw) => {
                serde_json::from_value(raw.clone()).map_err(|source| ConfigError::Subsystem {
                    subsystem: S::NAME.to_string(),
                    source,
                })?
            }
        };
        Ok((resolved.owner, settings))
    }

    /// Configurations directly linking to `id`, with the linked subsystem
    #[must_use]
    pub fn linked_from(&self, id: ConfigId) -> Vec<(ConfigId, String)> {
        self.configs
            .values()
            .flat_map(|config| {
                config
                    .links()
                    .iter()
                    .filter(move |(_, target)| **target == id)
                    .map(move |(subsystem, _)| (config.id(), subsystem.clone()))
            })
            .collect()
    }

    /// Copy `subsystem`'s effective settings from `source` into `dest`
    ///
    /// Any link `dest` had for the subsystem is dropped.
    ///
    /// # Errors
    /// See [`ConfigStore::resolve`]
    pub fn merge_subsystem(
        &mut self,
        dest: ConfigId,
        source: ConfigId,
        subsystem: &str,
    ) -> Result<(), ConfigError> {
        self.require(dest)?;
        let value = self.resolve(source, subsystem)?.settings.cloned();
        if let Some(config) = self.configs.get_mut(&dest) {
            config.clear_link(subsystem);
            config.set_raw(subsystem, value);
        }
        Ok(())
    }

    /// Remove a configuration, repairing links that pointed at it
    ///
    /// A dependent is re-pointed to the removed configuration's own link
    /// target for that subsystem when there is one; otherwise it is unlinked
    /// and receives a copy of the removed configuration's settings, so its
    /// effective settings do not change.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownConfig`] if `id` is missing
    pub fn remove(&mut self, id: ConfigId) -> Result<Configuration, ConfigError> {
        let removed = self
            .configs
            .shift_remove(&id)
            .ok_or(ConfigError::UnknownConfig(id))?;

        for config in self.configs.values_mut() {
            let dependents: Vec<String> = config
                .links()
                .iter()
                .filter(|(_, target)| **target == id)
                .map(|(subsystem, _)| subsystem.clone())
                .collect();

            for subsystem in dependents {
                match removed.link_target(&subsystem) {
                    Some(next) if next != config.id() => {
                        tracing::info!(config = %config.id(), %subsystem, %next, "re-pointed link after removal");
                        config.set_link(&subsystem, next);
                    }
                    _ => {
                        tracing::info!(config = %config.id(), %subsystem, "unlinked after removal");
                        config.clear_link(&subsystem);
                        config.set_raw(&subsystem, removed.raw(&subsystem).cloned());
                    }
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(n: usize) -> (ConfigStore, Vec<ConfigId>) {
        let mut store = ConfigStore::new();
        let ids = (0..n)
            .map(|i| {
                store
                    .insert(Configuration::new(format!("C{i}"), "f16c"))
                    .unwrap()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn link_and_resolve_chain() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], "radio", ids[1]).unwrap();
        store.link(ids[1], "radio", ids[2]).unwrap();

        assert_eq!(store.resolve(ids[0], "radio").unwrap().owner, ids[2]);
        assert_eq!(store.resolve(ids[0], "cmds").unwrap().owner, ids[0]);
    }

    #[test]
    fn rejects_self_link() {
        let (mut store, ids) = store_with(1);
        let err = store.link(ids[0], "radio", ids[0]).unwrap_err();
        assert!(matches!(err, ConfigError::Link(LinkError::SelfLink { .. })));
        assert!(store.get(ids[0]).unwrap().links().is_empty());
    }

    #[test]
    fn rejects_cycle_and_keeps_map() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], "radio", ids[1]).unwrap();
        store.link(ids[1], "radio", ids[2]).unwrap();

        let before = store.get(ids[2]).unwrap().links().clone();
        let err = store.link(ids[2], "radio", ids[0]).unwrap_err();
        match err {
            ConfigError::Link(LinkError::Cycle { path, .. }) => {
                assert_eq!(path, vec![ids[2], ids[0], ids[1], ids[2]]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.get(ids[2]).unwrap().links(), &before);
    }

    #[test]
    fn cycles_are_per_subsystem() {
        let (mut store, ids) = store_with(2);
        store.link(ids[0], "radio", ids[1]).unwrap();
        assert!(store.link(ids[1], "cmds", ids[0]).is_ok());
    }

    #[test]
    fn rejects_target_mismatch() {
        let (mut store, ids) = store_with(1);
        let other = store.insert(Configuration::new("E", "f15e")).unwrap();
        let err = store.link(ids[0], "radio", other).unwrap_err();
        assert!(matches!(err, ConfigError::Link(LinkError::TargetMismatch { .. })));
    }

    #[test]
    fn rejects_overlong_chain() {
        let (mut store, ids) = store_with(MAX_LINK_HOPS + 2);
        for pair in ids.windows(2).skip(1) {
            store.link(pair[0], "radio", pair[1]).unwrap();
        }
        let err = store.link(ids[0], "radio", ids[1]).unwrap_err();
        assert!(matches!(err, ConfigError::Link(LinkError::TooDeep { .. })));
    }

    #[test]
    fn relink_replaces_target() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], "radio", ids[1]).unwrap();
        store.link(ids[0], "radio", ids[2]).unwrap();
        assert_eq!(store.get(ids[0]).unwrap().link_target("radio"), Some(ids[2]));
        assert!(store.unlink(ids[0], "radio").unwrap());
        assert!(!store.unlink(ids[0], "radio").unwrap());
    }

    #[test]
    fn remove_repoints_through_chain() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], "radio", ids[1]).unwrap();
        store.link(ids[1], "radio", ids[2]).unwrap();

        store.remove(ids[1]).unwrap();
        assert_eq!(store.get(ids[0]).unwrap().link_target("radio"), Some(ids[2]));
    }

    #[test]
    fn remove_copies_terminal_settings() {
        let (mut store, ids) = store_with(2);
        store
            .get_mut(ids[1])
            .unwrap()
            .set_raw("radio", Some(json!({"com1": {"default_preset": "4"}})));
        store.link(ids[0], "radio", ids[1]).unwrap();

        store.remove(ids[1]).unwrap();
        let survivor = store.get(ids[0]).unwrap();
        assert!(!survivor.is_linked("radio"));
        assert_eq!(
            survivor.raw("radio"),
            Some(&json!({"com1": {"default_preset": "4"}}))
        );
        assert!(store.linked_from(ids[1]).is_empty());
    }

    #[test]
    fn merge_copies_effective_settings() {
        let (mut store, ids) = store_with(3);
        store
            .get_mut(ids[2])
            .unwrap()
            .set_raw("cmds", Some(json!({"chaff_bingo": "20"})));
        store.link(ids[1], "cmds", ids[2]).unwrap();
        store.link(ids[0], "cmds", ids[2]).unwrap();

        store.merge_subsystem(ids[0], ids[1], "cmds").unwrap();
        let merged = store.get(ids[0]).unwrap();
        assert!(!merged.is_linked("cmds"));
        assert_eq!(merged.raw("cmds"), Some(&json!({"chaff_bingo": "20"})));
    }

    #[test]
    fn linked_from_lists_dependents() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], "radio", ids[2]).unwrap();
        store.link(ids[1], "cmds", ids[2]).unwrap();
        let mut deps = store.linked_from(ids[2]);
        deps.sort();
        let mut expected = vec![(ids[0], "radio".to_string()), (ids[1], "cmds".to_string())];
        expected.sort();
        assert_eq!(deps, expected);
    }

    #[test]
    fn resolve_unknown_config() {
        let store = ConfigStore::new();
        assert!(matches!(
            store.resolve(ConfigId::new(), "radio"),
            Err(ConfigError::UnknownConfig(_))
        ));
    }
}
