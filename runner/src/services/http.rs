//! HTTP plumbing shared by the provider adapters

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ProviderSettings;
use crate::core::retry::classify_failure;
use crate::error::{RunnerError, RunnerResult};
use crate::types::CallOutcome;

/// System instruction applied to every prompt, for both providers
pub const SYSTEM_INSTRUCTION: &str = "Du er nøytral og faktabasert. \
    Svar på norsk (Bokmål). Unngå stereotyper. \
    Hold svaret kort (60–120 ord) og informativt.";

/// Build the HTTP client an adapter keeps for its lifetime
pub fn build_client(settings: &ProviderSettings) -> RunnerResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| RunnerError::HttpClientError {
            message: format!("Failed to create HTTP client: {e}"),
        })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Pull `"<status|type>: <message>"` out of a provider error body
pub fn api_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let detail = envelope.error;
    let message = detail.message.unwrap_or_default();

    match detail.status.or(detail.kind) {
        Some(label) if !message.is_empty() => Some(format!("{label}: {message}")),
        Some(label) => Some(label),
        None if !message.is_empty() => Some(message),
        None => None,
    }
}

/// Outcome for a non-2xx response
pub fn http_failure(status: StatusCode, body: &str) -> CallOutcome {
    let detail = api_error_message(body).unwrap_or_else(|| body.trim().to_string());
    let message = format!("HTTP {}: {}", status.as_u16(), detail);
    classify_failure(Some(status.as_u16()), &message).into_outcome(message)
}

/// Outcome for a request that never produced a response
pub fn transport_failure(err: &reqwest::Error) -> CallOutcome {
    let message = format!("RequestError: {err}");
    classify_failure(None, &message).into_outcome(message)
}

/// Outcome for a 2xx response whose body could not be decoded
pub fn decode_failure(err: &serde_json::Error) -> CallOutcome {
    CallOutcome::TerminalFailure {
        message: format!("DecodeError: {err}"),
    }
}
