//! Upload Orchestrator
//!
//! Assembles `Setup -> Subsystems -> Teardown` into one script. Phases are
//! built in that fixed order on a single builder; any error drops the
//! builder so no partial script escapes.

use crate::context::{BuildContext, UploadSettings};
use crate::error::BuildError;
use crate::target::{TargetDefinition, TargetKind};
use dtc_config::{ConfigError, ConfigId, ConfigStore, Configuration};
use dtc_script::{Instruction, Script, ScriptBuilder, StateQuery, TargetSnapshot};
use std::ops::Range;

/// Setup section name
pub const SETUP: &str = "setup";
/// Teardown section name
pub const TEARDOWN: &str = "teardown";

/// Top-level instruction range contributed by one phase or subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// `setup`, `teardown` or a subsystem name
    pub name: String,
    /// Range of top-level instruction indices
    pub range: Range<usize>,
}

/// A finished upload script and where each part of it came from
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPlan {
    script: Script,
    sections: Vec<Section>,
}

impl UploadPlan {
    /// Assembled script
    #[inline]
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Take the script
    #[inline]
    #[must_use]
    pub fn into_script(self) -> Script {
        self.script
    }

    /// Sections in script order; subsystems that emitted nothing are absent
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Top-level instructions contributed by `name`
    #[must_use]
    pub fn section(&self, name: &str) -> &[Instruction] {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map_or(&[] as &[Instruction], |s| {
                &self.script.instructions()[s.range.clone()]
            })
    }

    /// Names of subsystems that contributed instructions
    pub fn built_subsystems(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .map(|s| s.name.as_str())
            .filter(|n| *n != SETUP && *n != TEARDOWN)
    }
}

/// Builds upload scripts for one target
#[derive(Debug)]
pub struct UploadOrchestrator {
    target: TargetDefinition,
    settings: UploadSettings,
}

impl UploadOrchestrator {
    /// Orchestrator for a built-in target
    ///
    /// # Errors
    /// Returns [`BuildError`] if the target's table fails to load or the
    /// settings are unusable
    pub fn new(kind: TargetKind, settings: UploadSettings) -> Result<Self, BuildError> {
        settings.max_iterations()?;
        Ok(Self {
            target: kind.definition()?,
            settings,
        })
    }

    /// Orchestrator for a target definition supplied by the caller
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidSetting`] if the settings are unusable
    pub fn with_definition(
        target: TargetDefinition,
        settings: UploadSettings,
    ) -> Result<Self, BuildError> {
        settings.max_iterations()?;
        Ok(Self { target, settings })
    }

    /// Orchestrator for the target a configuration is written for
    ///
    /// # Errors
    /// Returns [`BuildError::UnknownTarget`] for unsupported targets
    pub fn for_config(config: &Configuration, settings: UploadSettings) -> Result<Self, BuildError> {
        Self::new(config.target().parse()?, settings)
    }

    /// Target definition
    #[inline]
    #[must_use]
    pub fn target(&self) -> &TargetDefinition {
        &self.target
    }

    /// Upload preferences
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    fn check(&self, config: &Configuration) -> Result<(), BuildError> {
        let expected = self.target.kind().as_str();
        if config.target() != expected {
            return Err(BuildError::TargetMismatch {
                expected: expected.to_string(),
                found: config.target().to_string(),
            });
        }
        if !self.target.seats().contains(&config.seat()) {
            return Err(BuildError::invalid(
                "seat",
                format!("{expected} has no {} seat", config.seat()),
            ));
        }
        Ok(())
    }

    /// State queries to run before building `config`
    ///
    /// Linked and default subsystems contribute none. Duplicates are
    /// removed; order follows the subsystem order.
    #[must_use]
    pub fn required_queries(&self, config: &Configuration) -> Vec<StateQuery> {
        let mut queries: Vec<StateQuery> = Vec::new();
        for stage in self.target.subsystems() {
            if config.is_linked(stage.name()) {
                continue;
            }
            for query in stage.queries(config) {
                if !queries.iter().any(|q| q.key == query.key) {
                    queries.push(query);
                }
            }
        }
        queries
    }

    /// Build the upload script for a standalone configuration
    ///
    /// Linked subsystems are skipped without resolving the link.
    ///
    /// # Errors
    /// Returns [`BuildError`] from any phase; no script is produced then
    pub fn build(
        &self,
        config: &Configuration,
        snapshot: &TargetSnapshot,
    ) -> Result<UploadPlan, BuildError> {
        self.assemble(config, snapshot, |name| Ok(config.is_linked(name)))
    }

    /// Build the upload script for a configuration held in `store`
    ///
    /// Each subsystem is resolved through its link chain and built only
    /// when this configuration is the owner.
    ///
    /// # Errors
    /// Returns [`BuildError::Config`] for unknown configurations or broken
    /// link chains, otherwise see [`UploadOrchestrator::build`]
    pub fn build_in_store(
        &self,
        store: &ConfigStore,
        id: ConfigId,
        snapshot: &TargetSnapshot,
    ) -> Result<UploadPlan, BuildError> {
        let config = store.get(id).ok_or(ConfigError::UnknownConfig(id))?;
        self.assemble(config, snapshot, |name| Ok(store.resolve(id, name)?.owner != id))
    }

    fn assemble(
        &self,
        config: &Configuration,
        snapshot: &TargetSnapshot,
        linked_away: impl Fn(&str) -> Result<bool, BuildError>,
    ) -> Result<UploadPlan, BuildError> {
        let span = tracing::info_span!(
            "assemble",
            aircraft = %self.target.kind(),
            config = %config.id(),
        );
        let _enter = span.enter();

        let result = self.assemble_phases(config, snapshot, linked_away);
        match &result {
            Ok(plan) => tracing::info!(
                instructions = plan.script().instruction_count(),
                subsystems = plan.built_subsystems().count(),
                "upload script assembled"
            ),
            Err(err) => tracing::error!(error = %err, "upload script assembly abandoned"),
        }
        result
    }

    fn assemble_phases(
        &self,
        config: &Configuration,
        snapshot: &TargetSnapshot,
        linked_away: impl Fn(&str) -> Result<bool, BuildError>,
    ) -> Result<UploadPlan, BuildError> {
        self.check(config)?;
        let ctx = BuildContext::new(self.target.registry(), snapshot, &self.settings, config.seat())?;
        let mut b = ctx.builder();
        let mut sections = Vec::new();

        phase(&mut b, &mut sections, SETUP, true, |b| (self.target.setup())(&ctx, b))?;

        for stage in self.target.subsystems() {
            let name = stage.name();
            if linked_away(name)? {
                tracing::debug!(subsystem = name, "linked away, skipped");
                continue;
            }
            phase(&mut b, &mut sections, name, false, |b| stage.build(config, &ctx, b)).map_err(
                |err| {
                    tracing::error!(subsystem = name, error = %err, "subsystem build failed");
                    err
                },
            )?;
        }

        phase(&mut b, &mut sections, TEARDOWN, true, |b| {
            (self.target.teardown())(&ctx, b)
        })?;

        Ok(UploadPlan {
            script: b.finish(),
            sections,
        })
    }
}

fn phase(
    b: &mut ScriptBuilder,
    sections: &mut Vec<Section>,
    name: &str,
    always_record: bool,
    build: impl FnOnce(&mut ScriptBuilder) -> Result<(), BuildError>,
) -> Result<(), BuildError> {
    let start = b.len();
    build(b)?;
    let end = b.len();
    if always_record || end > start {
        tracing::debug!(section = name, instructions = end - start, "section built");
        sections.push(Section {
            name: name.to_string(),
            range: start..end,
        });
    }
    Ok(())
}
