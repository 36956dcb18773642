//! Provider settings resolved once at startup
//!
//! Credentials come from the environment (or a `.env` file loaded by the
//! binaries) and are handed to the adapter constructor explicitly.

use std::fmt;
use std::time::Duration;

use shared::ProviderId;
use crate::error::{RunnerError, RunnerResult};

/// Environment variable overriding the HTTP timeout, in seconds
pub const HTTP_TIMEOUT_VAR: &str = "RUNNER_HTTP_TIMEOUT_SECONDS";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything an adapter needs to reach its provider
#[derive(Clone)]
pub struct ProviderSettings {
    pub provider: ProviderId,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve settings from the process environment
    pub fn from_env(provider: ProviderId) -> RunnerResult<Self> {
        Self::from_lookup(provider, |var| std::env::var(var).ok())
    }

    /// Resolve settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(provider: ProviderId, lookup: F) -> RunnerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_var = provider.api_key_var();
        let api_key = lookup(key_var)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(RunnerError::MissingCredential { var: key_var })?;

        let mut settings = Self::new(provider, api_key);

        if let Some(base_url) = lookup(provider.base_url_var()).filter(|url| !url.trim().is_empty()) {
            settings = settings.with_base_url(base_url.trim());
        }

        if let Some(raw) = lookup(HTTP_TIMEOUT_VAR) {
            let seconds: u64 = raw.trim().parse().map_err(|_| RunnerError::ConfigError {
                message: format!("{HTTP_TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"),
            })?;
            settings = settings.with_timeout(Duration::from_secs(seconds));
        }

        Ok(settings)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_key_is_reported_with_variable_name() {
        let err = ProviderSettings::from_lookup(ProviderId::OpenAI, lookup_from(&[])).unwrap_err();
        assert!(matches!(err, RunnerError::MissingCredential { var: "OPENAI_API_KEY" }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let err = ProviderSettings::from_lookup(ProviderId::Gemini, lookup_from(&[("GOOGLE_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, RunnerError::MissingCredential { var: "GOOGLE_API_KEY" }));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let settings = ProviderSettings::from_lookup(ProviderId::Gemini, lookup_from(&[("GOOGLE_API_KEY", "k")])).unwrap();
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(settings.timeout, DEFAULT_HTTP_TIMEOUT);

        let settings = ProviderSettings::from_lookup(
            ProviderId::OpenAI,
            lookup_from(&[
                ("OPENAI_API_KEY", "sk-test\n"),
                ("OPENAI_BASE_URL", "http://127.0.0.1:9999/v1/"),
                (HTTP_TIMEOUT_VAR, "5"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.base_url, "http://127.0.0.1:9999/v1");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_timeout_is_a_config_error() {
        let err = ProviderSettings::from_lookup(
            ProviderId::OpenAI,
            lookup_from(&[("OPENAI_API_KEY", "sk-test"), (HTTP_TIMEOUT_VAR, "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, RunnerError::ConfigError { .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = ProviderSettings::new(ProviderId::OpenAI, "sk-secret");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
