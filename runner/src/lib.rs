//! Prompt runner library
//!
//! Reads a CSV of religion/ideology items, sends each row's prompts to a
//! text-generation provider with retry/backoff, and records every response
//! to a semicolon-delimited CSV.

pub mod error;
pub mod types;
pub mod traits;
pub mod config;
pub mod core;
pub mod services;
pub mod cli;

// Re-export main types
pub use error::{RunnerError, RunnerResult};
pub use types::*;
pub use traits::*;
pub use config::ProviderSettings;
pub use core::{BackoffPolicy, PromptRunner, RetryController, RunReport, RunSettings, RunSummary};
pub use services::{GeminiClient, OpenAiClient, ResultWriter};
