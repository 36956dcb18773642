//! Prompt-execution driver and result accumulation

use std::time::Duration;

use shared::{provider_info, ProviderId};
use crate::core::prompts::extract_prompts;
use crate::core::retry::RetryController;
use crate::traits::ProviderClient;
use crate::types::{ResultRecord, SelectedRow};

/// Characters of each response echoed in the progress output
const PREVIEW_CHARS: usize = 80;

/// Throttling and identity for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub model: String,
    /// Pause after every provider call
    pub call_delay: Duration,
    /// Rows per block; 0 disables the block pause
    pub block_size: usize,
    /// Extra pause after each full block of rows
    pub block_pause: Duration,
}

impl RunSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            call_delay: Duration::from_secs(1),
            block_size: 10,
            block_pause: Duration::from_secs(5),
        }
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    pub fn with_block_pause(mut self, block_size: usize, pause: Duration) -> Self {
        self.block_size = block_size;
        self.block_pause = pause;
        self
    }
}

/// Append-only, call-ordered sequence of result records
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    records: Vec<ResultRecord>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub records: usize,
    pub errors: usize,
}

/// Everything a run produced, ready to be written
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<ResultRecord>,
    pub summary: RunSummary,
}

/// Drives selected rows through the provider, one call at a time
pub struct PromptRunner<C: ProviderClient> {
    client: C,
    controller: RetryController,
    settings: RunSettings,
}

impl<C: ProviderClient> PromptRunner<C> {
    pub fn new(client: C, controller: RetryController, settings: RunSettings) -> Self {
        Self {
            client,
            controller,
            settings,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.client.provider()
    }

    /// Run every prompt of every selected row, in row order then prompt order
    pub async fn run(&self, selected: &[SelectedRow<'_>]) -> RunReport {
        let mut accumulator = ResultAccumulator::new();
        let mut summary = RunSummary::default();

        for (position, row) in selected.iter().enumerate() {
            let added = self.process_row(row, &mut accumulator).await;
            if added == 0 {
                summary.rows_skipped += 1;
            } else {
                summary.rows_processed += 1;
            }

            let rows_done = position + 1;
            let block_full = self.settings.block_size > 0 && rows_done % self.settings.block_size == 0;
            if block_full && rows_done < selected.len() && !self.settings.block_pause.is_zero() {
                provider_info!(
                    self.provider(),
                    "Finished block of {} rows, pausing {:.1}s",
                    self.settings.block_size,
                    self.settings.block_pause.as_secs_f64()
                );
                tokio::time::sleep(self.settings.block_pause).await;
            }
        }

        summary.records = accumulator.len();
        summary.errors = accumulator.records().iter().filter(|r| r.result.is_error()).count();

        RunReport {
            records: accumulator.into_records(),
            summary,
        }
    }

    /// Run one row's prompts, appending a record per prompt; returns how many
    pub async fn process_row(&self, selected: &SelectedRow<'_>, accumulator: &mut ResultAccumulator) -> usize {
        let provider = self.provider();
        let row = selected.row;
        let prompts = extract_prompts(row);

        println!(
            "[row {}] {} → {} ({} prompts)",
            selected.visual_index,
            row.name(),
            row.norwegian_title(),
            prompts.len()
        );
        if prompts.is_empty() {
            println!("  0/0 no prompts in row");
            provider_info!(provider, row = selected.visual_index, "Skipping row without prompts");
            return 0;
        }

        for (index, prompt) in prompts.iter().enumerate() {
            let position = index + 1;
            let result = self.controller.call(&self.client, prompt, &self.settings.model).await;

            if result.is_error() {
                println!("  {}/{} ERROR -> {}", position, prompts.len(), result.error);
            } else {
                println!("  {}/{} ok -> {} ...", position, prompts.len(), result.preview(PREVIEW_CHARS));
            }

            accumulator.push(ResultRecord::new(
                provider,
                &self.settings.model,
                selected,
                position,
                prompt,
                result,
            ));

            tokio::time::sleep(self.settings.call_delay).await;
        }

        prompts.len()
    }
}
