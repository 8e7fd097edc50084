//! Telemetry frames, capture events and the latest-frame cache
//!
//! The cockpit publishes its full predicate state periodically. The cache
//! keeps only the newest frame; predicate evaluation samples it and never
//! waits for a fresh one.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One telemetry datagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Monotonic sequence number assigned by the cockpit
    pub seq: u64,
    /// Predicate state keyed by `name` or `name:arg1:arg2`
    #[serde(default)]
    pub state: BTreeMap<String, String>,
}

/// A user-triggered coordinate capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Elevation in feet
    pub elev: f64,
}

/// Newest frame as seen by a reader
#[derive(Debug, Clone)]
pub struct TelemetrySample {
    /// Frame sequence number
    pub seq: u64,
    /// Time since the frame arrived
    pub age: Duration,
    /// Frame state
    pub state: Arc<BTreeMap<String, String>>,
}

impl TelemetrySample {
    /// Value for a state key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.state.get(key).map(String::as_str)
    }
}

#[derive(Debug)]
struct Cached {
    seq: u64,
    received: Instant,
    state: Arc<BTreeMap<String, String>>,
}

/// Latest-wins telemetry cache shared by the listener and the executor
#[derive(Debug, Default)]
pub struct TelemetryCache {
    latest: RwLock<Option<Cached>>,
}

impl TelemetryCache {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame unless a newer one is already cached
    ///
    /// Returns whether the frame was accepted.
    pub fn update(&self, frame: TelemetryFrame) -> bool {
        let mut latest = self.latest.write();
        if let Some(current) = latest.as_ref() {
            if frame.seq < current.seq {
                tracing::trace!(seq = frame.seq, newest = current.seq, "dropped out-of-order frame");
                return false;
            }
        }
        *latest = Some(Cached {
            seq: frame.seq,
            received: Instant::now(),
            state: Arc::new(frame.state),
        });
        true
    }

    /// Newest frame, if any has arrived
    #[must_use]
    pub fn sample(&self) -> Option<TelemetrySample> {
        self.latest.read().as_ref().map(|cached| TelemetrySample {
            seq: cached.seq,
            age: cached.received.elapsed(),
            state: Arc::clone(&cached.state),
        })
    }

    /// Sequence number of the newest frame
    #[must_use]
    pub fn last_seq(&self) -> Option<u64> {
        self.latest.read().as_ref().map(|cached| cached.seq)
    }
}
