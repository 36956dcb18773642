//! Gemini adapter (generateContent)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shared::{provider_debug, ProviderId, TokenUsage};
use crate::config::ProviderSettings;
use crate::error::RunnerResult;
use crate::services::http::{build_client, decode_failure, http_failure, transport_failure, SYSTEM_INSTRUCTION};
use crate::traits::ProviderClient;
use crate::types::{CallOutcome, ProviderReply};

/// Gemini client; one request per `generate` call, no internal retries
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: &ProviderSettings) -> RunnerResult<Self> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// System hint and prompt joined so each call is self-contained
pub fn compose_prompt(prompt: &str) -> String {
    format!("{SYSTEM_INSTRUCTION}\n\n{prompt}")
}

// API types

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

/// Turn a decoded response into an outcome
///
/// Candidate texts are stitched together. With no text, a prompt-level
/// block reports `(blocked)`, a candidate reports its finish reason, and a
/// bare response is an (empty) success.
pub fn interpret_response(response: GenerateContentResponse) -> CallOutcome {
    let text: String = response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();
    let text = text.trim();

    if text.is_empty() {
        if response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()).is_some() {
            return CallOutcome::Blocked { finish_reason: None };
        }
        if let Some(first) = response.candidates.first() {
            return CallOutcome::Blocked {
                finish_reason: Some(first.finish_reason.clone().unwrap_or_else(|| "UNSPECIFIED".to_string())),
            };
        }
    }

    let usage = response
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count, u.total_token_count))
        .unwrap_or_default();

    CallOutcome::Success(ProviderReply::new(text, usage))
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn generate(&self, prompt: &str, model: &str) -> CallOutcome {
        let full_prompt = compose_prompt(prompt);
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: &full_prompt }],
            }],
        };

        provider_debug!(ProviderId::Gemini, model = %model, "Sending generateContent request");

        let response = match self
            .client
            .post(self.generate_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(&e),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return transport_failure(&e),
        };

        if !status.is_success() {
            return http_failure(status, &body);
        }

        match serde_json::from_str::<GenerateContentResponse>(&body) {
            Ok(parsed) => interpret_response(parsed),
            Err(e) => decode_failure(&e),
        }
    }
}
