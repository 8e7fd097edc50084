//! In-memory cockpit for tests and dry runs
//!
//! [`SimulatedTarget`] is a [`CommandSink`] that records every envelope,
//! applies configured reactions to invoked controls and publishes its full
//! state to a [`TelemetryCache`] after each command.

use crate::error::TransportError;
use crate::telemetry::{TelemetryCache, TelemetryFrame};
use crate::transport::CommandSink;
use dtc_script::CommandEnvelope;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// State change applied when a control is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Set the key to a fixed value
    Set(String),
    /// Flip `true`/`false`
    Toggle,
    /// Add to an integer value (missing counts as 0)
    Increment(i64),
}

#[derive(Debug, Clone)]
struct Reaction {
    device: u32,
    action: u32,
    key: String,
    effect: Effect,
}

/// Shared view of the envelopes a simulated target received
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<CommandEnvelope>>>);

impl CommandLog {
    /// Every envelope received so far
    #[must_use]
    pub fn envelopes(&self) -> Vec<CommandEnvelope> {
        self.0.lock().clone()
    }

    /// `(device, action, value)` of every invocation
    #[must_use]
    pub fn invocations(&self) -> Vec<(u32, u32, f64)> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| match e {
                CommandEnvelope::Invoke {
                    device,
                    action,
                    value,
                    ..
                } => Some((*device, *action, *value)),
                _ => None,
            })
            .collect()
    }

    /// Number of envelopes received
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Check if nothing was received
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Simulated cockpit
#[derive(Debug)]
pub struct SimulatedTarget {
    cache: Arc<TelemetryCache>,
    state: BTreeMap<String, String>,
    seq: u64,
    reactions: Vec<Reaction>,
    log: CommandLog,
    fail_after: Option<usize>,
    frozen: bool,
}

impl Default for SimulatedTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTarget {
    /// Target with empty state; nothing is published until state is set
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Arc::new(TelemetryCache::new()),
            state: BTreeMap::new(),
            seq: 0,
            reactions: Vec::new(),
            log: CommandLog::default(),
            fail_after: None,
            frozen: false,
        }
    }

    /// Target reporting cockpit power
    #[must_use]
    pub fn powered() -> Self {
        Self::new().with_state("IsCockpitPowered", "true")
    }

    /// Set a state value and publish
    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.insert(key.into(), value.into());
        self.publish();
        self
    }

    /// Apply `effect` to `key` whenever `(device, action)` is invoked
    #[must_use]
    pub fn on_invoke(mut self, device: u32, action: u32, key: impl Into<String>, effect: Effect) -> Self {
        self.reactions.push(Reaction {
            device,
            action,
            key: key.into(),
            effect,
        });
        self
    }

    /// Fail every send after `n` successful ones
    #[must_use]
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Stop publishing telemetry after commands
    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Cache this target publishes into
    #[must_use]
    pub fn cache(&self) -> Arc<TelemetryCache> {
        Arc::clone(&self.cache)
    }

    /// Handle on the received envelopes
    #[must_use]
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Current value of a state key
    #[must_use]
    pub fn state(&self, key: &str) -> Option<&str> {
        self.state.get(key).map(String::as_str)
    }

    fn publish(&mut self) {
        self.seq += 1;
        self.cache.update(TelemetryFrame {
            seq: self.seq,
            state: self.state.clone(),
        });
    }

    fn react(&mut self, device: u32, action: u32) {
        for reaction in &self.reactions {
            if reaction.device != device || reaction.action != action {
                continue;
            }
            let slot = self.state.entry(reaction.key.clone()).or_default();
            *slot = match &reaction.effect {
                Effect::Set(value) => value.clone(),
                Effect::Toggle => (slot.as_str() != "true").to_string(),
                Effect::Increment(by) => (slot.parse::<i64>().unwrap_or(0) + by).to_string(),
            };
        }
    }
}

#[async_trait::async_trait]
impl CommandSink for SimulatedTarget {
    async fn send(&mut self, envelope: &CommandEnvelope) -> Result<(), TransportError> {
        if self.fail_after.is_some_and(|n| self.log.len() >= n) {
            return Err(TransportError::Closed);
        }
        self.log.0.lock().push(envelope.clone());
        if let CommandEnvelope::Invoke { device, action, .. } = envelope {
            self.react(*device, *action);
        }
        if !self.frozen {
            self.publish();
        }
        Ok(())
    }
}
