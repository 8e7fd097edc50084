//! DTC Registry - Action catalogue for remote cockpit targets
//!
//! Maps human-meaningful `(device, action)` names to the numeric identities
//! the remote cockpit understands.
//!
//! # Core Concepts
//!
//! - [`Control`]: one manipulable element (button, knob position, switch throw)
//! - [`Device`]: a named panel grouping controls under one device id
//! - [`ActionRegistry`]: immutable per-target catalogue built from a static table
//!
//! # Example
//!
//! ```rust
//! use dtc_registry::builtin;
//!
//! let registry = builtin("f16c").unwrap();
//! let enter = registry.lookup("UFC", "ENTR").unwrap();
//! assert_eq!(enter.values().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod control;
mod error;
mod registry;
mod table;

pub use control::{Control, Device};
pub use error::RegistryError;
pub use registry::ActionRegistry;
pub use table::{builtin, builtin_targets, ActionEntry, DeviceEntry, RegistryTable};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
