//! Runner data types

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use shared::{ProviderId, TokenUsage};

/// Columns that identify an item; copied onto every result record
pub const IDENTITY_COLUMNS: [&str; 4] = ["name", "category", "norwegian_title", "norwegian_url"];

/// Prompt columns, in the order they are sent
pub const PROMPT_COLUMNS: [&str; 3] = ["prompt_1", "prompt_2", "prompt_3"];

/// Placeholder response texts written when no real content is available
pub mod sentinel {
    pub const EMPTY: &str = "[EMPTY]";
    pub const BLOCKED: &str = "(blocked)";
    pub const ERROR: &str = "[ERROR]";
    pub const RETRIES_EXHAUSTED: &str = "ERROR: too many retries due to rate limits";

    /// Empty answer that still carried a finish reason
    pub fn empty_or_blocked(finish_reason: &str) -> String {
        format!("[EMPTY_OR_BLOCKED finish_reason={finish_reason}]")
    }
}

/// One data row of the input CSV, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    fields: HashMap<String, String>,
}

impl InputRow {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of `column`, or the empty string when the row lacks it
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.get("name")
    }

    pub fn category(&self) -> &str {
        self.get("category")
    }

    pub fn norwegian_title(&self) -> &str {
        self.get("norwegian_title")
    }

    pub fn norwegian_url(&self) -> &str {
        self.get("norwegian_url")
    }
}

/// Which rows of the input to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RowMode {
    /// Only the first data row (row 2 in a spreadsheet)
    #[default]
    First,
    /// Every data row
    All,
}

impl fmt::Display for RowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowMode::First => write!(f, "first"),
            RowMode::All => write!(f, "all"),
        }
    }
}

/// A row chosen for the run, with the index a spreadsheet user would see
#[derive(Debug, Clone, Copy)]
pub struct SelectedRow<'a> {
    pub visual_index: usize,
    pub row: &'a InputRow,
}

/// Non-empty prompts of one row, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptBatch(Vec<String>);

impl PromptBatch {
    pub fn new(prompts: Vec<String>) -> Self {
        Self(prompts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn prompts(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a PromptBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Text and usage returned by a successful provider call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderReply {
    pub text: String,
    pub usage: TokenUsage,
}

impl ProviderReply {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Outcome of exactly one provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The provider answered (possibly with empty text)
    Success(ProviderReply),
    /// The provider refused or filtered the content
    Blocked { finish_reason: Option<String> },
    /// Rate limit, quota or overload; worth another attempt
    TransientFailure { message: String },
    /// Anything else; retrying will not help
    TerminalFailure { message: String },
}

/// Normalized result of one prompt after retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    /// Never empty: a sentinel stands in when there is no real answer
    pub response_text: String,
    pub usage: TokenUsage,
    /// Empty unless the call ended in a terminal failure
    pub error: String,
}

impl CallResult {
    pub fn answered(reply: ProviderReply) -> Self {
        let text = reply.text.trim();
        Self {
            response_text: if text.is_empty() { sentinel::EMPTY.to_string() } else { text.to_string() },
            usage: reply.usage,
            error: String::new(),
        }
    }

    pub fn blocked(finish_reason: Option<&str>) -> Self {
        let response_text = match finish_reason {
            Some(reason) if !reason.trim().is_empty() => sentinel::empty_or_blocked(reason.trim()),
            _ => sentinel::BLOCKED.to_string(),
        };
        Self {
            response_text,
            usage: TokenUsage::default(),
            error: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            response_text: sentinel::ERROR.to_string(),
            usage: TokenUsage::default(),
            error: message.into(),
        }
    }

    pub fn retries_exhausted() -> Self {
        Self {
            response_text: sentinel::RETRIES_EXHAUSTED.to_string(),
            usage: TokenUsage::default(),
            error: String::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Single-line prefix of the response for progress output
    pub fn preview(&self, max_chars: usize) -> String {
        self.response_text
            .chars()
            .take(max_chars)
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect()
    }
}

/// One line of the output CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub timestamp_utc: DateTime<Utc>,
    pub provider: ProviderId,
    pub model: String,
    pub row_index: usize,
    pub name: String,
    pub category: String,
    pub norwegian_title: String,
    pub norwegian_url: String,
    /// 1-based position of the prompt within its row's batch
    pub prompt_position: usize,
    pub prompt_text: String,
    pub result: CallResult,
}

impl ResultRecord {
    /// Build a record stamped with the current UTC time
    pub fn new(
        provider: ProviderId,
        model: &str,
        selected: &SelectedRow<'_>,
        prompt_position: usize,
        prompt_text: &str,
        result: CallResult,
    ) -> Self {
        Self {
            timestamp_utc: Utc::now(),
            provider,
            model: model.to_string(),
            row_index: selected.visual_index,
            name: selected.row.name().to_string(),
            category: selected.row.category().to_string(),
            norwegian_title: selected.row.norwegian_title().to_string(),
            norwegian_url: selected.row.norwegian_url().to_string(),
            prompt_position,
            prompt_text: prompt_text.to_string(),
            result,
        }
    }

    pub fn prompt_id(&self) -> String {
        format!("p{}", self.prompt_position)
    }

    /// RFC 3339 timestamp with microseconds and an explicit `+00:00` offset
    pub fn timestamp_iso(&self) -> String {
        self.timestamp_utc.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}
