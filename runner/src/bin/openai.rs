use std::process::ExitCode;

use shared::ProviderId;

#[tokio::main]
async fn main() -> ExitCode {
    runner::cli::main_for(ProviderId::OpenAI).await
}
