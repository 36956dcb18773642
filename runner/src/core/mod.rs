//! Runner core logic

pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod selector;

pub use pipeline::{PromptRunner, ResultAccumulator, RunReport, RunSettings, RunSummary};
pub use prompts::extract_prompts;
pub use retry::{classify_failure, BackoffPolicy, FailureKind, RetryController};
pub use selector::select_rows;
