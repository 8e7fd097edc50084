//! DTC Core - Subsystem builders and the Upload Orchestrator
//!
//! Turns a [`Configuration`](dtc_config::Configuration) into one upload
//! script:
//! - [`UploadOrchestrator`]: `Setup -> Subsystems -> Teardown`, in the
//!   target's fixed subsystem order
//! - [`TargetDefinition`]: a target as data (registry, seats, fragments,
//!   ordered [`SubsystemStage`]s)
//! - [`subsystems`]: typed settings and pure builder functions
//!
//! Building is synchronous and never touches the network. Decisions about
//! live cockpit state are either taken from a pre-fetched
//! [`TargetSnapshot`](dtc_script::TargetSnapshot) or emitted as `If`/`While`
//! nodes for the executor.
//!
//! # Example
//!
//! ```rust
//! use dtc_config::Configuration;
//! use dtc_core::{TargetKind, UploadOrchestrator, UploadSettings};
//! use dtc_core::subsystems::misc::MiscSettings;
//! use dtc_script::TargetSnapshot;
//!
//! let mut config = Configuration::new("Training", "f16c");
//! config
//!     .set_setting(&MiscSettings { tacan_channel: "12".into(), ..Default::default() })
//!     .unwrap();
//!
//! let orchestrator = UploadOrchestrator::new(TargetKind::F16C, UploadSettings::default()).unwrap();
//! let plan = orchestrator.build(&config, &TargetSnapshot::new()).unwrap();
//! assert_eq!(plan.section("misc").len(), 2); // one tens step, one ones step
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod context;
mod error;
mod orchestrator;
pub mod relative;
pub mod subsystems;
mod target;
pub mod targets;

pub use context::{BuildContext, UploadSettings};
pub use error::BuildError;
pub use orchestrator::{Section, UploadOrchestrator, UploadPlan, SETUP, TEARDOWN};
pub use target::{
    BuildFn, FragmentFn, QueryFn, Subsystem, SubsystemStage, TargetDefinition, TargetKind,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
