//! DTC Script - Command-stream IR for cockpit uploads
//!
//! Turns intent ("press these keys, but only if the page is showing") into
//! an ordered instruction tree that an executor replays against a live
//! cockpit.
//!
//! Building is purely structural: no I/O and no predicate evaluation. All
//! decisions about live cockpit state are deferred to execution time and
//! expressed as [`Instruction::If`] / [`Instruction::While`] nodes.
//!
//! # Example
//!
//! ```rust
//! use dtc_registry::builtin;
//! use dtc_script::{ScriptBuilder, ScriptError};
//!
//! # fn main() -> Result<(), ScriptError> {
//! let registry = builtin("f16c")?;
//! let mut builder = ScriptBuilder::new();
//! builder.if_block("IsCockpitPowered", "false", &[], |b| {
//!     b.abort("cockpit is not powered");
//!     Ok::<_, ScriptError>(())
//! })?;
//! builder.keypad(registry, "UFC", "305")?;
//! builder.action(registry.lookup("UFC", "ENTR")?);
//!
//! let script = builder.finish();
//! assert_eq!(script.invocations().count(), 4);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builder;
mod error;
mod instruction;
mod predicate;
pub mod wire;

pub use builder::{ScriptBuilder, DEFAULT_MAX_ITERATIONS};
pub use error::ScriptError;
pub use instruction::{Instruction, Invocation, Script};
pub use predicate::{Predicate, StateQuery, TargetSnapshot};
pub use wire::CommandEnvelope;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
