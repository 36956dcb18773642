//! Result CSV writer
//!
//! Output is UTF-8 with a byte-order mark, `;`-delimited, with every field
//! quoted and embedded quotes doubled, so Nordic-locale spreadsheets open it
//! without an import dialog.
//!
//! Backslashes are written literally; quotes are escaped by doubling, never
//! as `\"`, so files differ from backslash-escaped exports on that point.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use shared::ProviderId;
use crate::error::RunnerResult;
use crate::types::ResultRecord;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const OUTPUT_DELIMITER: u8 = b';';

/// Engine label written for the chat-completions provider
const CHAT_ENGINE: &str = "chat";

/// A column of the result CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputColumn {
    TimestampUtc,
    Provider,
    Engine,
    Model,
    RowIndex,
    Name,
    Category,
    NorwegianTitle,
    NorwegianUrl,
    PromptId,
    PromptText,
    ResponseText,
    PromptTokens,
    CompletionTokens,
    TotalTokens,
    Error,
}

impl OutputColumn {
    pub fn header(&self) -> &'static str {
        match self {
            OutputColumn::TimestampUtc => "timestamp_utc",
            OutputColumn::Provider => "provider",
            OutputColumn::Engine => "engine",
            OutputColumn::Model => "model",
            OutputColumn::RowIndex => "row_index",
            OutputColumn::Name => "name",
            OutputColumn::Category => "category",
            OutputColumn::NorwegianTitle => "norwegian_title",
            OutputColumn::NorwegianUrl => "norwegian_url",
            OutputColumn::PromptId => "prompt_id",
            OutputColumn::PromptText => "prompt_text",
            OutputColumn::ResponseText => "response_text",
            OutputColumn::PromptTokens => "prompt_tokens",
            OutputColumn::CompletionTokens => "completion_tokens",
            OutputColumn::TotalTokens => "total_tokens",
            OutputColumn::Error => "error",
        }
    }

    pub fn value(&self, record: &ResultRecord) -> String {
        let count = |n: Option<u64>| n.map(|n| n.to_string()).unwrap_or_default();
        match self {
            OutputColumn::TimestampUtc => record.timestamp_iso(),
            OutputColumn::Provider => record.provider.to_string(),
            OutputColumn::Engine => CHAT_ENGINE.to_string(),
            OutputColumn::Model => record.model.clone(),
            OutputColumn::RowIndex => record.row_index.to_string(),
            OutputColumn::Name => record.name.clone(),
            OutputColumn::Category => record.category.clone(),
            OutputColumn::NorwegianTitle => record.norwegian_title.clone(),
            OutputColumn::NorwegianUrl => record.norwegian_url.clone(),
            OutputColumn::PromptId => record.prompt_id(),
            OutputColumn::PromptText => record.prompt_text.clone(),
            OutputColumn::ResponseText => record.result.response_text.clone(),
            OutputColumn::PromptTokens => count(record.result.usage.prompt_tokens),
            OutputColumn::CompletionTokens => count(record.result.usage.completion_tokens),
            OutputColumn::TotalTokens => count(record.result.usage.total()),
            OutputColumn::Error => record.result.error.clone(),
        }
    }
}

pub const GEMINI_COLUMNS: &[OutputColumn] = &[
    OutputColumn::TimestampUtc,
    OutputColumn::Provider,
    OutputColumn::Model,
    OutputColumn::RowIndex,
    OutputColumn::Name,
    OutputColumn::Category,
    OutputColumn::NorwegianTitle,
    OutputColumn::NorwegianUrl,
    OutputColumn::PromptId,
    OutputColumn::PromptText,
    OutputColumn::ResponseText,
    OutputColumn::Error,
];

pub const OPENAI_COLUMNS: &[OutputColumn] = &[
    OutputColumn::TimestampUtc,
    OutputColumn::Provider,
    OutputColumn::Engine,
    OutputColumn::Model,
    OutputColumn::RowIndex,
    OutputColumn::Name,
    OutputColumn::Category,
    OutputColumn::NorwegianTitle,
    OutputColumn::NorwegianUrl,
    OutputColumn::PromptId,
    OutputColumn::PromptText,
    OutputColumn::ResponseText,
    OutputColumn::PromptTokens,
    OutputColumn::CompletionTokens,
    OutputColumn::TotalTokens,
    OutputColumn::Error,
];

/// Column layout for `provider`; token columns only where usage is reported
pub fn columns_for(provider: ProviderId) -> &'static [OutputColumn] {
    if provider.reports_usage() {
        OPENAI_COLUMNS
    } else {
        GEMINI_COLUMNS
    }
}

/// Serializes a finished run in a fixed column order
#[derive(Debug, Clone, Copy)]
pub struct ResultWriter {
    columns: &'static [OutputColumn],
}

impl ResultWriter {
    pub fn new(columns: &'static [OutputColumn]) -> Self {
        Self { columns }
    }

    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(columns_for(provider))
    }

    pub fn columns(&self) -> &'static [OutputColumn] {
        self.columns
    }

    /// Create (or replace) the file at `path` with all `records`
    pub fn write_to_path(&self, path: &Path, records: &[ResultRecord]) -> RunnerResult<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file), records)
    }

    /// Write BOM, header and `records` to `out`
    pub fn write<W: Write>(&self, mut out: W, records: &[ResultRecord]) -> RunnerResult<()> {
        out.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(OUTPUT_DELIMITER)
            .quote(b'"')
            .quote_style(csv::QuoteStyle::Always)
            .double_quote(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(out);

        writer.write_record(self.columns.iter().map(|c| c.header()))?;
        for record in records {
            writer.write_record(self.columns.iter().map(|c| c.value(record)))?;
        }
        writer.flush()?;
        Ok(())
    }
}
