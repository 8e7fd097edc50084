//! DTC Config - Configurations, defaults and links
//!
//! The data-level machinery the upload builders query to decide what to
//! emit:
//!
//! - [`SubsystemSetting`]: typed settings for one avionics subsystem, with
//!   an explicit notion of "default"
//! - [`Configuration`]: named bag of subsystem settings plus a link map
//! - [`ConfigStore`]: owns configurations and enforces link acyclicity when
//!   a link is created
//! - [`file`]: versioned persisted form with one-time upgrade rules
//! - [`ClipboardPayload`]: tagged single-subsystem exchange format
//!
//! # Example
//!
//! ```rust
//! use dtc_config::{ConfigStore, Configuration};
//!
//! let mut store = ConfigStore::new();
//! let a = store.insert(Configuration::new("Strike", "f16c")).unwrap();
//! let b = store.insert(Configuration::new("Package", "f16c")).unwrap();
//!
//! store.link(a, "radio", b).unwrap();
//! assert!(store.link(b, "radio", a).is_err()); // would close a cycle
//! assert_eq!(store.resolve(a, "radio").unwrap().owner, b);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod clipboard;
mod configuration;
mod error;
pub mod file;
mod id;
mod setting;
mod store;

pub use clipboard::{ClipboardPayload, CLIPBOARD_PREFIX};
pub use configuration::{Configuration, CrewSeat};
pub use error::{ConfigError, LinkError};
pub use id::ConfigId;
pub use setting::{effective, is_default_value, SubsystemSetting};
pub use store::{ConfigStore, Resolved, MAX_LINK_HOPS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
