//! Target definitions
//!
//! A target is data: an action registry, the seats it has, setup and
//! teardown fragments, and an ordered list of subsystem stages. One generic
//! orchestrator drives every target.

use crate::context::BuildContext;
use crate::error::BuildError;
use dtc_config::{Configuration, CrewSeat, SubsystemSetting};
use dtc_registry::ActionRegistry;
use dtc_script::{ScriptBuilder, StateQuery};
use std::fmt;
use std::str::FromStr;

/// Builder function for one subsystem's settings
pub type BuildFn<S> = fn(&S, &BuildContext<'_>, &mut ScriptBuilder) -> Result<(), BuildError>;

/// State queries a subsystem needs answered before it is built
pub type QueryFn<S> = fn(&S) -> Vec<StateQuery>;

/// Setup or teardown fragment builder
pub type FragmentFn = fn(&BuildContext<'_>, &mut ScriptBuilder) -> Result<(), BuildError>;

/// One subsystem of a target, as seen by the orchestrator
pub trait SubsystemStage: Send + Sync + fmt::Debug {
    /// Subsystem name, as stored in configurations
    fn name(&self) -> &'static str;

    /// Queries needed to build `config`'s settings for this subsystem
    fn queries(&self, config: &Configuration) -> Vec<StateQuery>;

    /// Append this subsystem's instructions for `config`
    ///
    /// Appends nothing for default or linked settings.
    ///
    /// # Errors
    /// Returns [`BuildError`] when the settings cannot be expressed or a
    /// control is missing from the registry
    fn build(
        &self,
        config: &Configuration,
        ctx: &BuildContext<'_>,
        b: &mut ScriptBuilder,
    ) -> Result<(), BuildError>;
}

/// Adapter from a typed builder function to a [`SubsystemStage`]
pub struct Subsystem<S> {
    build: BuildFn<S>,
    queries: Option<QueryFn<S>>,
}

impl<S: SubsystemSetting> Subsystem<S> {
    /// Stage for `S` built by `build`
    #[must_use]
    pub fn new(build: BuildFn<S>) -> Self {
        Self {
            build,
            queries: None,
        }
    }

    /// Declare the state queries this stage consults
    #[must_use]
    pub fn with_queries(mut self, queries: QueryFn<S>) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Settings to build, or `None` when the stage must append nothing
    ///
    /// Unreadable stored state is replaced by defaults.
    fn active_settings(config: &Configuration) -> Option<S> {
        let settings = config.setting::<S>().unwrap_or_else(|err| {
            tracing::warn!(
                config = %config.id(),
                subsystem = S::NAME,
                error = %err,
                "unreadable subsystem state, using defaults"
            );
            S::default()
        });
        if settings.is_default() {
            tracing::trace!(subsystem = S::NAME, "default settings, skipped");
            return None;
        }
        if config.is_linked(S::NAME) {
            tracing::debug!(subsystem = S::NAME, "linked subsystem, skipped");
            return None;
        }
        Some(settings)
    }
}

impl<S> fmt::Debug for Subsystem<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("queries", &self.queries.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: SubsystemSetting + Send + Sync> SubsystemStage for Subsystem<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn queries(&self, config: &Configuration) -> Vec<StateQuery> {
        match (self.queries, Self::active_settings(config)) {
            (Some(queries), Some(settings)) => queries(&settings),
            _ => Vec::new(),
        }
    }

    fn build(
        &self,
        config: &Configuration,
        ctx: &BuildContext<'_>,
        b: &mut ScriptBuilder,
    ) -> Result<(), BuildError> {
        match Self::active_settings(config) {
            Some(settings) => (self.build)(&settings, ctx, b),
            None => Ok(()),
        }
    }
}

/// Supported aircraft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Single-seat F-16C
    F16C,
    /// Two-seat F-15E
    F15E,
}

impl TargetKind {
    /// All supported targets
    pub const ALL: [TargetKind; 2] = [TargetKind::F16C, TargetKind::F15E];

    /// Name used in configurations and registry tables
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F16C => "f16c",
            Self::F15E => "f15e",
        }
    }

    /// Build the definition for this target
    ///
    /// # Errors
    /// Returns [`BuildError::Registry`] if the built-in table fails to load
    pub fn definition(self) -> Result<TargetDefinition, BuildError> {
        match self {
            Self::F16C => crate::targets::f16c::definition(),
            Self::F15E => crate::targets::f15e::definition(),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BuildError::UnknownTarget(s.to_string()))
    }
}

/// Everything the orchestrator needs to build for one target
#[derive(Debug)]
pub struct TargetDefinition {
    kind: TargetKind,
    registry: &'static ActionRegistry,
    seats: &'static [CrewSeat],
    setup: FragmentFn,
    teardown: FragmentFn,
    subsystems: Vec<Box<dyn SubsystemStage>>,
}

impl TargetDefinition {
    /// Assemble a definition; `subsystems` are built in the given order
    #[must_use]
    pub fn new(
        kind: TargetKind,
        registry: &'static ActionRegistry,
        seats: &'static [CrewSeat],
        setup: FragmentFn,
        teardown: FragmentFn,
        subsystems: Vec<Box<dyn SubsystemStage>>,
    ) -> Self {
        Self {
            kind,
            registry,
            seats,
            setup,
            teardown,
            subsystems,
        }
    }

    /// Target kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Action registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'static ActionRegistry {
        self.registry
    }

    /// Crew seats
    #[inline]
    #[must_use]
    pub fn seats(&self) -> &'static [CrewSeat] {
        self.seats
    }

    /// Subsystem stages in build order
    #[inline]
    #[must_use]
    pub fn subsystems(&self) -> &[Box<dyn SubsystemStage>] {
        &self.subsystems
    }

    /// Subsystem names in build order
    pub fn subsystem_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.subsystems.iter().map(|stage| stage.name())
    }

    pub(crate) fn setup(&self) -> FragmentFn {
        self.setup
    }

    pub(crate) fn teardown(&self) -> FragmentFn {
        self.teardown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_names() {
        assert_eq!("f16c".parse::<TargetKind>().unwrap(), TargetKind::F16C);
        assert_eq!("F15E".parse::<TargetKind>().unwrap(), TargetKind::F15E);
        assert!(matches!(
            "a10c".parse::<TargetKind>(),
            Err(BuildError::UnknownTarget(_))
        ));
    }

    #[test]
    fn definitions_load() {
        for kind in TargetKind::ALL {
            let def = kind.definition().unwrap();
            assert_eq!(def.kind(), kind);
            assert_eq!(def.registry().target(), kind.as_str());
            assert!(!def.seats().is_empty());
        }
    }
}
