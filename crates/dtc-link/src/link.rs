//! Cockpit link
//!
//! Owns the one command channel and the telemetry cache for a target
//! connection. Only one upload or pre-fetch may use it at a time.

use crate::error::{ExecutionError, TransportError};
use crate::executor::{CancelToken, ExecutionReport, Executor};
use crate::settings::LinkSettings;
use crate::telemetry::{CaptureEvent, TelemetryCache};
use crate::transport::{
    bind_udp, spawn_capture_listener, spawn_telemetry_listener, CommandSink, TcpCommandSink,
};
use dtc_script::{CommandEnvelope, Script, StateQuery, TargetSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Connection to one cockpit
pub struct Link<S: CommandSink> {
    sink: Mutex<S>,
    cache: Arc<TelemetryCache>,
    settings: LinkSettings,
    listener: Option<JoinHandle<()>>,
}

impl<S: CommandSink> Link<S> {
    /// Link over an existing sink and cache
    pub fn new(sink: S, cache: Arc<TelemetryCache>, settings: LinkSettings) -> Self {
        Self {
            sink: Mutex::new(sink),
            cache,
            settings,
            listener: None,
        }
    }

    /// Telemetry cache
    #[must_use]
    pub fn cache(&self) -> &Arc<TelemetryCache> {
        &self.cache
    }

    /// Link settings
    #[must_use]
    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Check if an upload currently holds the link
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.sink.try_lock().is_err()
    }

    /// Execute a script
    ///
    /// On a link that has not seen telemetry yet, waits up to the
    /// staleness limit for the first frame before running.
    ///
    /// # Errors
    /// Returns [`ExecutionError::UploadInProgress`] if another upload holds
    /// the link, otherwise see [`Executor::run`]
    pub async fn upload(
        &self,
        script: &Script,
        cancel: &CancelToken,
    ) -> Result<ExecutionReport, ExecutionError> {
        let mut sink = self
            .sink
            .try_lock()
            .map_err(|_| ExecutionError::UploadInProgress)?;
        self.await_first_frame().await;
        Executor::new(&mut *sink, &self.cache, &self.settings)
            .run(script, cancel)
            .await
    }

    /// Wait until the cache holds a frame or the staleness limit passes
    ///
    /// Returns whether a frame arrived.
    pub async fn await_first_frame(&self) -> bool {
        let deadline = Instant::now() + self.settings.stale_after();
        let step = self.settings.poll_interval().min(Duration::from_millis(50));
        loop {
            if self.cache.last_seq().is_some() {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    waited_ms = self.settings.stale_after_ms,
                    "no telemetry received from cockpit"
                );
                return false;
            }
            tokio::time::sleep(step).await;
        }
    }

    /// Ask the cockpit for live values before building
    ///
    /// Sends every query once, then samples the cache until all answers
    /// are present or the query timeout passes. Unanswered queries stay
    /// unknown in the snapshot.
    ///
    /// # Errors
    /// Returns [`ExecutionError::UploadInProgress`] if the link is busy or
    /// [`ExecutionError::Transport`] if a query cannot be sent
    pub async fn query_snapshot(
        &self,
        queries: &[StateQuery],
    ) -> Result<TargetSnapshot, ExecutionError> {
        if queries.is_empty() {
            return Ok(TargetSnapshot::new());
        }
        let mut sink = self
            .sink
            .try_lock()
            .map_err(|_| ExecutionError::UploadInProgress)?;
        for query in queries {
            sink.send(&CommandEnvelope::query(query)).await?;
        }
        drop(sink);

        let deadline = Instant::now() + Duration::from_millis(self.settings.query_timeout_ms);
        loop {
            let mut snapshot = TargetSnapshot::new();
            if let Some(sample) = self.cache.sample() {
                for query in queries {
                    if let Some(value) = sample.get(&query.key) {
                        snapshot.insert(query.key.clone(), value);
                    }
                }
            }
            if snapshot.len() == queries.len() {
                tracing::debug!(answered = snapshot.len(), "snapshot complete");
                return Ok(snapshot);
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    answered = snapshot.len(),
                    asked = queries.len(),
                    "snapshot incomplete, unanswered values stay unknown"
                );
                return Ok(snapshot);
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }
    }
}

impl Link<TcpCommandSink> {
    /// Open the command channel and start the telemetry listener
    ///
    /// # Errors
    /// Returns [`TransportError`] if the command port is unreachable or the
    /// telemetry port cannot be bound
    pub async fn connect(settings: LinkSettings) -> Result<Self, TransportError> {
        let sink = TcpCommandSink::connect(
            &settings.command_addr(),
            Duration::from_millis(settings.connect_timeout_ms),
        )
        .await?;
        let socket = bind_udp(&settings.telemetry_bind()).await?;
        let cache = Arc::new(TelemetryCache::new());
        let listener = spawn_telemetry_listener(socket, Arc::clone(&cache));

        let mut link = Self::new(sink, cache, settings);
        link.listener = Some(listener);
        Ok(link)
    }
}

impl<S: CommandSink> Drop for Link<S> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Start the capture listener
///
/// Captures are independent of uploads and keep arriving while one runs.
///
/// # Errors
/// Returns [`TransportError::Bind`] if the capture port is unavailable
pub async fn listen_captures(
    settings: &LinkSettings,
    capacity: usize,
) -> Result<(mpsc::Receiver<CaptureEvent>, JoinHandle<()>), TransportError> {
    let socket = bind_udp(&settings.capture_bind()).await?;
    let (tx, rx) = mpsc::channel(capacity);
    Ok((rx, spawn_capture_listener(socket, tx)))
}
