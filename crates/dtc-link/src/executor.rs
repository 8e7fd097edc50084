//! Script executor
//!
//! Runs a script locally against the command channel and the telemetry
//! cache. Instructions execute strictly in order. Predicates are answered
//! from the newest cached frame; `While` re-polls up to its bound with a
//! fixed pause between polls. Cancellation is honoured only between
//! instructions.

use crate::error::{ExecutionError, StaleAge};
use crate::settings::LinkSettings;
use crate::telemetry::TelemetryCache;
use crate::transport::CommandSink;
use dtc_script::{CommandEnvelope, Instruction, Predicate, Script};
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Operator cancellation flag shared with a running upload
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next instruction boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a script run ended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// Every instruction ran
    #[default]
    Completed,
    /// An `Abort` was reached; carries its message
    Aborted(String),
    /// The operator cancelled
    Cancelled,
}

/// Summary of one script run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Controls invoked
    pub invoked: usize,
    /// Remote routines called
    pub calls: usize,
    /// Time spent in `Wait` instructions
    pub waited_ms: u64,
    /// Predicate evaluations
    pub polls: usize,
    /// Loops that reached their bound with the predicate still holding
    pub exhausted_loops: usize,
    /// Final outcome
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ExecutionReport {
    /// Check if the script ran to the end
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

enum Flow {
    Continue,
    Stop(Outcome),
}

/// Executes scripts over a command sink
pub struct Executor<'a, S: CommandSink> {
    sink: &'a mut S,
    cache: &'a TelemetryCache,
    poll_interval: Duration,
    stale_after: Duration,
}

impl<'a, S: CommandSink> Executor<'a, S> {
    /// Executor using the link's timing
    pub fn new(sink: &'a mut S, cache: &'a TelemetryCache, settings: &LinkSettings) -> Self {
        Self::with_timing(sink, cache, settings.poll_interval(), settings.stale_after())
    }

    /// Executor with explicit timing
    pub fn with_timing(
        sink: &'a mut S,
        cache: &'a TelemetryCache,
        poll_interval: Duration,
        stale_after: Duration,
    ) -> Self {
        Self {
            sink,
            cache,
            poll_interval,
            stale_after,
        }
    }

    /// Run a script to completion, abort or cancellation
    ///
    /// Instructions already sent are not rolled back when the run stops
    /// early.
    ///
    /// # Errors
    /// Returns [`ExecutionError::InvalidScript`] before sending anything if
    /// the script fails validation, and [`ExecutionError::Transport`] or
    /// [`ExecutionError::TelemetryStale`] when a channel fails mid-run
    pub async fn run(
        &mut self,
        script: &Script,
        cancel: &CancelToken,
    ) -> Result<ExecutionReport, ExecutionError> {
        script.validate()?;
        tracing::info!(instructions = script.instruction_count(), "executing script");

        let mut report = ExecutionReport::default();
        let flow = self
            .run_block(script.instructions(), cancel, &mut report)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, invoked = report.invoked, "upload incomplete");
                err
            })?;
        report.outcome = match flow {
            Flow::Continue => Outcome::Completed,
            Flow::Stop(outcome) => outcome,
        };

        match &report.outcome {
            Outcome::Completed => tracing::info!(invoked = report.invoked, "script completed"),
            Outcome::Aborted(message) => tracing::warn!(%message, "script aborted"),
            Outcome::Cancelled => tracing::warn!(invoked = report.invoked, "script cancelled"),
        }
        Ok(report)
    }

    fn run_block<'b>(
        &'b mut self,
        block: &'b [Instruction],
        cancel: &'b CancelToken,
        report: &'b mut ExecutionReport,
    ) -> BoxFuture<'b, Result<Flow, ExecutionError>> {
        Box::pin(async move {
            for instruction in block {
                if cancel.is_cancelled() {
                    return Ok(Flow::Stop(Outcome::Cancelled));
                }
                match instruction {
                    Instruction::Invoke { control, delay_ms } => {
                        tracing::trace!(control = %control.control, "invoke");
                        self.sink.send(&CommandEnvelope::invoke(control, *delay_ms)).await?;
                        report.invoked += 1;
                        sleep_ms(control.settle_delay(*delay_ms)).await;
                    }
                    Instruction::Wait { ms } => {
                        sleep_ms(*ms).await;
                        report.waited_ms += u64::from(*ms);
                    }
                    Instruction::If {
                        predicate,
                        expected,
                        args,
                        then,
                    } => {
                        if self.holds(predicate, expected, args, report)? {
                            if let Flow::Stop(outcome) = self.run_block(then, cancel, report).await? {
                                return Ok(Flow::Stop(outcome));
                            }
                        }
                    }
                    Instruction::While {
                        predicate,
                        expected,
                        args,
                        body,
                        max_iterations,
                    } => {
                        let mut iterations = 0;
                        loop {
                            if cancel.is_cancelled() {
                                return Ok(Flow::Stop(Outcome::Cancelled));
                            }
                            if !self.holds(predicate, expected, args, report)? {
                                break;
                            }
                            if iterations == max_iterations.get() {
                                tracing::warn!(%predicate, iterations, "loop bound reached, continuing");
                                report.exhausted_loops += 1;
                                break;
                            }
                            if let Flow::Stop(outcome) = self.run_block(body, cancel, report).await? {
                                return Ok(Flow::Stop(outcome));
                            }
                            iterations += 1;
                            tokio::time::sleep(self.poll_interval).await;
                        }
                    }
                    Instruction::Abort { message } => {
                        return Ok(Flow::Stop(Outcome::Aborted(message.clone())));
                    }
                    Instruction::CallFunction {
                        name,
                        args,
                        delay_ms,
                    } => {
                        tracing::debug!(%name, ?args, "call");
                        self.sink.send(&CommandEnvelope::call(name, args, *delay_ms)).await?;
                        report.calls += 1;
                        sleep_ms(delay_ms.unwrap_or(0)).await;
                    }
                }
            }
            Ok(Flow::Continue)
        })
    }

    fn holds(
        &self,
        predicate: &Predicate,
        expected: &str,
        args: &[String],
        report: &mut ExecutionReport,
    ) -> Result<bool, ExecutionError> {
        report.polls += 1;
        let stale = |age| ExecutionError::TelemetryStale {
            predicate: predicate.name().to_string(),
            age,
        };
        let sample = self.cache.sample().ok_or_else(|| stale(StaleAge::Never))?;
        if sample.age > self.stale_after {
            let ms = u64::try_from(sample.age.as_millis()).unwrap_or(u64::MAX);
            return Err(stale(StaleAge::Millis(ms)));
        }

        let key = predicate.state_key(args);
        let value = sample.get(&key);
        tracing::trace!(%key, ?value, expected, seq = sample.seq, "predicate sampled");
        Ok(value == Some(expected))
    }
}

async fn sleep_ms(ms: u32) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
    }
}
