//! Core types used by both provider binaries

use std::fmt;

/// Text-generation providers a run can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
    OpenAI,
}

impl ProviderId {
    /// Environment variable holding the provider credential
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "GOOGLE_API_KEY",
            ProviderId::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Environment variable that may override the provider endpoint
    pub fn base_url_var(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "GEMINI_BASE_URL",
            ProviderId::OpenAI => "OPENAI_BASE_URL",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "https://generativelanguage.googleapis.com",
            ProviderId::OpenAI => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini-2.5-flash",
            ProviderId::OpenAI => "gpt-5",
        }
    }

    /// Whether the provider's API reports token usage worth recording
    pub fn reports_usage(&self) -> bool {
        matches!(self, ProviderId::OpenAI)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Gemini => write!(f, "gemini"),
            ProviderId::OpenAI => write!(f, "openai"),
        }
    }
}

/// Token usage reported by a provider, when it reports any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn new(prompt_tokens: Option<u64>, completion_tokens: Option<u64>, total_tokens: Option<u64>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    /// Total tokens, derived from the parts when the provider omits it
    pub fn total(&self) -> Option<u64> {
        self.total_tokens.or(match (self.prompt_tokens, self.completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        })
    }
}
