//! Shared types for the prompt runner binaries
//!
//! Contains only the vocabulary both provider binaries agree on: provider
//! identity, token accounting and the logging bootstrap. Everything that
//! concerns a single run lives in the `runner` crate.

pub mod types;
pub mod logging;

pub use types::*;
