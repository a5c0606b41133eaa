//! # lh-core
//!
//! Shared error and result types for the lanham workspace.
//!
//! Every other crate returns [`Result`] from its fallible operations so the
//! CLI can surface a single descriptive message when a run aborts.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

pub use error::{Error, Result};

/// Workspace version, stamped into every artifact.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
