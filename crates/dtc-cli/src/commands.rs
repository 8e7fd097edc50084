//! Subcommand implementations
//!
//! Each command returns what it would print so the binary stays a thin
//! dispatcher.

use anyhow::{Context, Result};
use dtc_config::file::{self, FORMAT_VERSION};
use dtc_config::{ConfigId, ConfigStore, Configuration};
use dtc_core::{UploadOrchestrator, UploadPlan, UploadSettings};
use dtc_link::{CancelToken, CommandSink, ExecutionReport, Link};
use dtc_script::wire::encode_script;
use dtc_script::{Script, TargetSnapshot};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// A primary configuration plus the configurations its links may reach
#[derive(Debug)]
pub struct Workspace {
    store: ConfigStore,
    primary: ConfigId,
}

impl Workspace {
    /// Load `primary` and every `with` document
    ///
    /// # Errors
    /// Returns an error if a document cannot be loaded or two documents
    /// share an id
    pub fn load(primary: &Path, with: &[PathBuf]) -> Result<Self> {
        let mut store = ConfigStore::new();
        let primary = Self::add(&mut store, primary)?;
        for path in with {
            Self::add(&mut store, path)?;
        }
        Ok(Self { store, primary })
    }

    /// Workspace over configurations already in memory
    ///
    /// # Errors
    /// Returns an error if two configurations share an id
    pub fn from_configs(primary: Configuration, others: Vec<Configuration>) -> Result<Self> {
        let mut store = ConfigStore::new();
        let primary = store.insert(primary)?;
        for config in others {
            store.insert(config)?;
        }
        Ok(Self { store, primary })
    }

    fn add(store: &mut ConfigStore, path: &Path) -> Result<ConfigId> {
        let config =
            file::load(path).with_context(|| format!("cannot load {}", path.display()))?;
        store
            .insert(config)
            .with_context(|| format!("cannot add {}", path.display()))
    }

    /// Configuration being built
    ///
    /// # Errors
    /// Never fails for a workspace built by [`Workspace::load`]
    pub fn primary(&self) -> Result<&Configuration> {
        self.store
            .get(self.primary)
            .context("primary configuration missing from workspace")
    }

    /// All loaded configurations
    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn orchestrator(&self, settings: &UploadSettings) -> Result<UploadOrchestrator> {
        UploadOrchestrator::for_config(self.primary()?, settings.clone())
            .context("operation failed: the aircraft is not supported")
    }

    fn plan(
        &self,
        orchestrator: &UploadOrchestrator,
        snapshot: &TargetSnapshot,
    ) -> Result<UploadPlan> {
        orchestrator
            .build_in_store(&self.store, self.primary, snapshot)
            .context("operation failed: the upload script could not be built")
    }
}

/// Message shown to the operator for a failed command
///
/// Only the outermost context is shown; the full chain belongs in the log.
#[must_use]
pub fn operator_message(err: &anyhow::Error) -> String {
    format!("error: {err}")
}

/// Build the primary configuration without live state
///
/// # Errors
/// Returns an error if the target is unknown or building fails
pub fn build(workspace: &Workspace, settings: &UploadSettings) -> Result<UploadPlan> {
    let orchestrator = workspace.orchestrator(settings)?;
    workspace.plan(&orchestrator, &TargetSnapshot::new())
}

/// Render a plan as an annotated tree, or as wire envelopes in JSON
///
/// # Errors
/// Returns an error if JSON encoding fails
pub fn render_plan(plan: &UploadPlan, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&encode_script(plan.script()))?);
    }
    let mut out = String::new();
    for section in plan.sections() {
        let block = Script::new(plan.section(&section.name).to_vec());
        writeln!(out, "# {} ({} instructions)", section.name, block.instruction_count())?;
        write!(out, "{block}")?;
    }
    Ok(out)
}

/// Pre-fetch live state, build and execute over `link`
///
/// # Errors
/// Returns an error if pre-fetch, building or execution fails. An operator
/// abort is reported in the returned report instead.
pub async fn upload<S: CommandSink>(
    link: &Link<S>,
    workspace: &Workspace,
    settings: &UploadSettings,
    cancel: &CancelToken,
) -> Result<ExecutionReport> {
    let orchestrator = workspace.orchestrator(settings)?;
    let queries = orchestrator.required_queries(workspace.primary()?);
    let snapshot = link
        .query_snapshot(&queries)
        .await
        .context("operation failed: cockpit state could not be read")?;
    let plan = workspace.plan(&orchestrator, &snapshot)?;
    link.upload(plan.script(), cancel)
        .await
        .context("operation failed: the upload did not finish")
}

/// Render an execution report
///
/// # Errors
/// Returns an error if JSON encoding fails
pub fn render_report(report: &ExecutionReport, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let outcome = match &report.outcome {
        dtc_link::Outcome::Completed => "completed".to_string(),
        dtc_link::Outcome::Aborted(message) => format!("aborted: {message}"),
        dtc_link::Outcome::Cancelled => "cancelled".to_string(),
    };
    Ok(format!(
        "upload {outcome}\n  controls invoked: {}\n  routines called: {}\n  state polls: {}\n  exhausted loops: {}\n",
        report.invoked, report.calls, report.polls, report.exhausted_loops
    ))
}

/// List the devices and controls of a built-in target
///
/// # Errors
/// Returns an error for unknown targets
pub fn tables(target: &str) -> Result<String> {
    let registry = dtc_registry::builtin(target)
        .with_context(|| format!("no control table for target {target:?}"))?;
    let mut out = String::new();
    for device in registry.devices() {
        writeln!(out, "{} (device {})", device.name(), device.id())?;
        for control in device.controls() {
            writeln!(
                out,
                "  {:<14} action {:<5} delay {:>4} ms  values {:?}",
                control.name(),
                control.action_id(),
                control.delay_ms(),
                control.values()
            )?;
        }
    }
    Ok(out)
}

/// Rewrite a document in the current format
///
/// Returns the version the document was written with. Current documents
/// are left untouched.
///
/// # Errors
/// Returns an error if the file cannot be read, upgraded or written
pub fn upgrade(path: &Path) -> Result<u64> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let mut raw: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not JSON", path.display()))?;
    let found = file::upgrade(&mut raw)?;
    if found == u64::from(FORMAT_VERSION) {
        tracing::info!(path = %path.display(), "document already current");
        return Ok(found);
    }
    let config = file::from_json(&text)?;
    file::save(&config, path)?;
    tracing::info!(path = %path.display(), from = found, to = FORMAT_VERSION, "document upgraded");
    Ok(found)
}
