//! DTC Link - Cockpit transport and script execution
//!
//! Three channels connect the tool to a running cockpit:
//!
//! - a reliable, ordered command channel (TCP) carrying
//!   [`CommandEnvelope`](dtc_script::CommandEnvelope)s
//! - a telemetry channel (UDP) carrying full predicate-state frames
//! - a capture channel (UDP) carrying user-triggered coordinates
//!
//! The [`Executor`] walks a script locally: invocations are sent in order,
//! predicates are answered from the newest cached telemetry frame and
//! bounded loops re-poll at a fixed interval.
//!
//! # Example
//!
//! ```rust
//! use dtc_link::test_harness::SimulatedTarget;
//! use dtc_link::{CancelToken, Executor, LinkSettings};
//! use dtc_script::ScriptBuilder;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut target = SimulatedTarget::powered();
//! let cache = target.cache();
//!
//! let mut builder = ScriptBuilder::new();
//! builder.if_block("IsCockpitPowered", "false", &[], |b| {
//!     b.abort("Cockpit is not powered");
//!     Ok::<_, dtc_script::ScriptError>(())
//! })?;
//! builder.wait(10);
//!
//! let report = Executor::new(&mut target, &cache, &LinkSettings::default())
//!     .run(&builder.finish(), &CancelToken::new())
//!     .await?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod executor;
mod link;
mod settings;
mod telemetry;
pub mod test_harness;
mod transport;

pub use error::{ExecutionError, SettingsError, StaleAge, TransportError};
pub use executor::{CancelToken, ExecutionReport, Executor, Outcome};
pub use link::{listen_captures, Link};
pub use settings::{
    LinkSettings, DEFAULT_CAPTURE_PORT, DEFAULT_COMMAND_PORT, DEFAULT_TELEMETRY_PORT,
};
pub use telemetry::{CaptureEvent, TelemetryCache, TelemetryFrame, TelemetrySample};
pub use transport::{
    bind_udp, spawn_capture_listener, spawn_telemetry_listener, CommandSink, TcpCommandSink,
    MAX_DATAGRAM,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
