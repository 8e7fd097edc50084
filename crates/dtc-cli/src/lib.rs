//! DTC CLI - Operator surface for the `dtc` binary
//!
//! Loads configuration documents, builds upload scripts and drives uploads
//! over a cockpit link.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod app;
pub mod commands;
mod settings;

pub use settings::CliSettings;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` decides the filter unless `verbose` forces debug. Logs go to
/// stderr so command output stays clean.
pub fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
