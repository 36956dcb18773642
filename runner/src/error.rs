//! Runner error types
//!
//! Only startup-time conditions are errors. Anything that goes wrong while
//! calling a provider is turned into a recorded `CallResult` instead.

use thiserror::Error;

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Runner error types
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Missing credential: please set {var} in your environment")]
    MissingCredential { var: &'static str },

    #[error("No data rows found in input CSV")]
    EmptyInput,

    #[error("Input CSV {path} is missing required columns: {}", missing.join(", "))]
    MissingColumns { path: String, missing: Vec<String> },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("HTTP client error: {message}")]
    HttpClientError { message: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RunnerError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            RunnerError::MissingCredential { .. } => 2,
            RunnerError::EmptyInput => 3,
            _ => 1,
        }
    }
}
