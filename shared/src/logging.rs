//! Shared logging utilities for consistent tracing across both binaries

use crate::types::ProviderId;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Filter directives for a run: our crates at `base_level`, HTTP noise muted
pub fn filter_directives(base_level: &str) -> String {
    format!("runner={base_level},shared={base_level},reqwest=warn")
}

/// Initialize the stderr tracing subscriber with an optional log level
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_tracing(provider: ProviderId, log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let base_level = log_level.unwrap_or("info");
    let directives = filter_directives(base_level);

    let installed = fmt()
        .with_env_filter(EnvFilter::new(&directives))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(provider = %provider, directives = %directives, "tracing initialised");
    }
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for provider-aware info logging
#[macro_export]
macro_rules! provider_info {
    ($provider:expr, $($arg:tt)*) => {
        tracing::info!(
            provider = %$provider,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for provider-aware warning logging
#[macro_export]
macro_rules! provider_warn {
    ($provider:expr, $($arg:tt)*) => {
        tracing::warn!(
            provider = %$provider,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for provider-aware debug logging
#[macro_export]
macro_rules! provider_debug {
    ($provider:expr, $($arg:tt)*) => {
        tracing::debug!(
            provider = %$provider,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(provider: &ProviderId, details: &str) {
    info!(
        provider = %provider,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(provider: &ProviderId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        provider = %provider,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(provider: &ProviderId, message: &str) {
    info!(
        provider = %provider,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}
