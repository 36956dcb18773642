//! Runner trait definitions for dependency injection

use async_trait::async_trait;

use shared::ProviderId;
use crate::types::CallOutcome;

/// One text-generation provider, called once per prompt
///
/// Implementations never retry; they report what happened as a
/// `CallOutcome` and leave the decision to the retry controller.
#[mockall::automock]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider this client talks to
    fn provider(&self) -> ProviderId;

    /// Send `prompt` to `model` under the fixed system instruction
    async fn generate(&self, prompt: &str, model: &str) -> CallOutcome;
}
