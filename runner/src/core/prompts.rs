//! Prompt extraction

use crate::types::{InputRow, PromptBatch, PROMPT_COLUMNS};

/// Trimmed, non-empty prompts of `row` in column order
pub fn extract_prompts(row: &InputRow) -> PromptBatch {
    let prompts = PROMPT_COLUMNS
        .iter()
        .map(|column| row.get(column).trim())
        .filter(|prompt| !prompt.is_empty())
        .map(str::to_string)
        .collect();

    PromptBatch::new(prompts)
}
