//! OpenAI adapter (chat completions)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shared::{provider_debug, ProviderId, TokenUsage};
use crate::config::ProviderSettings;
use crate::error::RunnerResult;
use crate::services::http::{build_client, decode_failure, http_failure, transport_failure, SYSTEM_INSTRUCTION};
use crate::traits::ProviderClient;
use crate::types::{CallOutcome, ProviderReply};

/// Completion budget per answer
pub const MAX_COMPLETION_TOKENS: u32 = 600;

/// OpenAI chat client; one request per `generate` call, no internal retries
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(settings: &ProviderSettings) -> RunnerResult<Self> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// API types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

/// Turn a decoded chat response into an outcome
///
/// An empty answer counts as blocked only when the provider says so, via a
/// `content_filter` finish reason or an explicit refusal.
pub fn interpret_response(response: ChatResponse) -> CallOutcome {
    let usage = response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens, u.total_tokens))
        .unwrap_or_default();

    let Some(choice) = response.choices.into_iter().next() else {
        return CallOutcome::Success(ProviderReply::new("", usage));
    };

    let (content, refusal) = choice
        .message
        .map(|m| (m.content.unwrap_or_default(), m.refusal.unwrap_or_default()))
        .unwrap_or_default();
    let text = content.trim();

    if text.is_empty() {
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return CallOutcome::Blocked {
                finish_reason: choice.finish_reason,
            };
        }
        if !refusal.trim().is_empty() {
            return CallOutcome::Blocked { finish_reason: None };
        }
    }

    CallOutcome::Success(ProviderReply::new(text, usage))
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    async fn generate(&self, prompt: &str, model: &str) -> CallOutcome {
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        provider_debug!(ProviderId::OpenAI, model = %model, "Sending chat completion request");

        let response = match self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
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

        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(parsed) => interpret_response(parsed),
            Err(e) => decode_failure(&e),
        }
    }
}
