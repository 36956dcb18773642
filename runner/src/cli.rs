//! Command-line entry shared by both provider binaries

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use shared::logging::{init_tracing, log_error, log_startup, log_success};
use shared::ProviderId;
use crate::config::ProviderSettings;
use crate::core::{select_rows, PromptRunner, RetryController, RunReport, RunSettings, RunSummary};
use crate::error::{RunnerError, RunnerResult};
use crate::services::{load_rows, GeminiClient, OpenAiClient, ResultWriter};
use crate::traits::ProviderClient;
use crate::types::{RowMode, SelectedRow};

#[derive(Parser, Debug, Clone)]
#[command(about = "Send each row's prompts to a text-generation provider and save the answers as CSV")]
pub struct Args {
    /// Input CSV with name, category, norwegian_title, norwegian_url and prompt_1..prompt_3
    #[arg(long)]
    pub input: PathBuf,

    /// Output CSV (defaults to a provider-specific file name)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Model identifier (defaults to the provider's standard model)
    #[arg(long)]
    pub model: Option<String>,

    /// Run only the first data row, or all of them
    #[arg(long, value_enum, default_value_t = RowMode::First)]
    pub rows: RowMode,

    /// Seconds to pause after every call
    #[arg(long, default_value_t = 1.0)]
    pub sleep: f64,

    /// Rows per block; 0 disables the block pause
    #[arg(long, default_value_t = 10)]
    pub block_size: usize,

    /// Extra seconds to pause after each full block
    #[arg(long, default_value_t = 5.0)]
    pub block_pause: f64,

    /// Log level for the runner crates
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

pub fn default_output(provider: ProviderId) -> PathBuf {
    match provider {
        ProviderId::Gemini => PathBuf::from("religious_ideology_gemini_responses.csv"),
        ProviderId::OpenAI => PathBuf::from("religious_ideology_gpt5_responses.csv"),
    }
}

fn seconds(flag: &str, value: f64) -> RunnerResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| RunnerError::ConfigError {
        message: format!("--{flag} must be a non-negative number of seconds, got {value}"),
    })
}

/// Resolve credentials from the environment, then run
pub async fn run(provider: ProviderId, args: &Args) -> RunnerResult<RunSummary> {
    let settings = ProviderSettings::from_env(provider)?;
    run_with_settings(args, settings).await
}

/// Load, select, execute and write one run against `settings.provider`
///
/// Fails with `EmptyInput` before anything is written when the input has no
/// data rows. The output file is written once, after the last call.
pub async fn run_with_settings(args: &Args, settings: ProviderSettings) -> RunnerResult<RunSummary> {
    let provider = settings.provider;
    let run_settings = RunSettings::new(args.model.clone().unwrap_or_else(|| provider.default_model().to_string()))
        .with_call_delay(seconds("sleep", args.sleep)?)
        .with_block_pause(args.block_size, seconds("block-pause", args.block_pause)?);

    let rows = load_rows(&args.input)?;
    let selected = select_rows(&rows, args.rows)?;
    let output = args.output.clone().unwrap_or_else(|| default_output(provider));

    println!("Loaded {} items from {}", rows.len(), args.input.display());
    println!("Provider: {}, Model: {}, Mode: {}", provider, run_settings.model, args.rows);
    log_startup(
        &provider,
        &format!("{} rows with model {}", selected.len(), run_settings.model),
    );

    let report = match provider {
        ProviderId::Gemini => execute(GeminiClient::new(&settings)?, run_settings, &selected).await,
        ProviderId::OpenAI => execute(OpenAiClient::new(&settings)?, run_settings, &selected).await,
    };

    write_report(provider, &output, &report)?;
    Ok(report.summary)
}

async fn execute<C: ProviderClient>(client: C, settings: RunSettings, selected: &[SelectedRow<'_>]) -> RunReport {
    let controller = RetryController::for_provider(client.provider());
    PromptRunner::new(client, controller, settings).run(selected).await
}

fn write_report(provider: ProviderId, output: &Path, report: &RunReport) -> RunnerResult<()> {
    ResultWriter::for_provider(provider).write_to_path(output, &report.records)?;
    println!("\nSaved → {}", output.display());

    let summary = report.summary;
    log_success(
        &provider,
        &format!(
            "{} rows processed, {} skipped, {} records written, {} errors",
            summary.rows_processed, summary.rows_skipped, summary.records, summary.errors
        ),
    );
    Ok(())
}

/// Full binary lifecycle: `.env`, arguments, logging, run, exit code
pub async fn main_for(provider: ProviderId) -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(provider, Some(&args.log_level));

    match run(provider, &args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&provider, "Run", &e);
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
