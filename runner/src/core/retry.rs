//! Retry/backoff around a single provider call, plus failure classification

use std::sync::OnceLock;
use std::time::Duration;

use rand::Rng;
use regex::Regex;

use shared::{provider_debug, provider_warn, ProviderId};
use crate::traits::ProviderClient;
use crate::types::{CallOutcome, CallResult};

/// How a provider failure should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Blocked,
    Terminal,
}

impl FailureKind {
    /// Wrap `message` in the matching outcome variant
    pub fn into_outcome(self, message: impl Into<String>) -> CallOutcome {
        match self {
            FailureKind::Transient => CallOutcome::TransientFailure { message: message.into() },
            FailureKind::Blocked => CallOutcome::Blocked { finish_reason: None },
            FailureKind::Terminal => CallOutcome::TerminalFailure { message: message.into() },
        }
    }
}

fn transient_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b429\b|\brate\b|rate[ _-]?limit|quota|resource[ _]?exhausted|too many requests|\bbusy\b|overloaded")
            .expect("transient pattern is valid")
    })
}

fn blocked_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bsafety\b|\bblocked\b").expect("blocked pattern is valid"))
}

/// Classify a failed call from its HTTP status (if any) and message text
///
/// 429 and 503 are always transient. Without such a status the message is
/// matched against known rate-limit/quota/busy wording. `rate` and `429`
/// only count as whole words, so request URLs such as `...:generateContent`
/// never look like a rate limit. A message lacking this wording is terminal.
pub fn classify_failure(status: Option<u16>, message: &str) -> FailureKind {
    if matches!(status, Some(429) | Some(503)) || transient_pattern().is_match(message) {
        FailureKind::Transient
    } else if blocked_pattern().is_match(message) {
        FailureKind::Blocked
    } else {
        FailureKind::Terminal
    }
}

/// Exponential backoff, optionally jittered, bounded by `max_delay`
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Upper bound of uniform random jitter added to each delay
    pub jitter: Option<Duration>,
}

impl BackoffPolicy {
    /// 6 attempts, `2^k s` plus up to 1 s jitter, capped at 30 s
    pub fn gemini() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: Some(Duration::from_secs(1)),
        }
    }

    /// 3 attempts, `2^k s` without jitter, capped at 30 s
    pub fn openai() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: None,
        }
    }

    pub fn for_provider(provider: ProviderId) -> Self {
        match provider {
            ProviderId::Gemini => Self::gemini(),
            ProviderId::OpenAI => Self::openai(),
        }
    }

    /// Delay to wait after the failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let jitter = self
            .jitter
            .filter(|j| !j.is_zero())
            .map(|j| rand::thread_rng().gen_range(0.0..j.as_secs_f64()))
            .unwrap_or(0.0);

        let cap = self.max_delay.as_secs_f64();
        let seconds = (base + jitter).min(cap);
        Duration::try_from_secs_f64(seconds).unwrap_or(self.max_delay)
    }
}

/// Retries transient failures of one provider call and converts every
/// outcome into a recorded `CallResult`
#[derive(Debug, Clone)]
pub struct RetryController {
    policy: BackoffPolicy,
}

impl RetryController {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy }
    }

    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(BackoffPolicy::for_provider(provider))
    }

    /// Call the provider until it answers, blocks, fails terminally, or the
    /// attempt budget runs out. Never returns an error.
    pub async fn call<C>(&self, client: &C, prompt: &str, model: &str) -> CallResult
    where
        C: ProviderClient + ?Sized,
    {
        let provider = client.provider();
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match client.generate(prompt, model).await {
                CallOutcome::Success(reply) => return CallResult::answered(reply),
                CallOutcome::Blocked { finish_reason } => {
                    provider_debug!(provider, finish_reason = ?finish_reason, "Response blocked");
                    return CallResult::blocked(finish_reason.as_deref());
                }
                CallOutcome::TerminalFailure { message } => {
                    provider_warn!(provider, error = %message, "Call failed, not retrying");
                    return CallResult::failed(message);
                }
                CallOutcome::TransientFailure { message } => {
                    let remaining = max_attempts - attempt - 1;
                    if remaining == 0 {
                        provider_warn!(
                            provider,
                            error = %message,
                            "Rate limited (attempt {}/{}), giving up",
                            attempt + 1,
                            max_attempts
                        );
                        break;
                    }

                    let wait = self.policy.delay_for(attempt);
                    provider_warn!(
                        provider,
                        error = %message,
                        "Rate limited (attempt {}/{}). Sleeping {:.1}s...",
                        attempt + 1,
                        max_attempts,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        CallResult::retries_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockProviderClient;
    use crate::types::{sentinel, ProviderReply};
    use shared::TokenUsage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> CallOutcome {
        CallOutcome::TransientFailure {
            message: "429 Resource has been exhausted (e.g. check quota).".to_string(),
        }
    }

    fn answer(text: &str) -> CallOutcome {
        CallOutcome::Success(ProviderReply::new(text, TokenUsage::new(Some(5), Some(7), Some(12))))
    }

    /// Mock that rate-limits `failures` times, then answers
    fn flaky_client(failures: u32, calls: Arc<AtomicU32>) -> MockProviderClient {
        let mut client = MockProviderClient::new();
        client.expect_provider().return_const(ProviderId::Gemini);
        client.expect_generate().returning(move |_, _| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < failures { rate_limited() } else { answer("Svar") }
        });
        client
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(classify_failure(Some(429), "anything"), FailureKind::Transient);
        assert_eq!(classify_failure(Some(503), "Service Unavailable"), FailureKind::Transient);
        assert_eq!(classify_failure(None, "RESOURCE_EXHAUSTED"), FailureKind::Transient);
        assert_eq!(classify_failure(Some(400), "You exceeded your current quota"), FailureKind::Transient);
        assert_eq!(classify_failure(None, "Rate limit reached for gpt-5"), FailureKind::Transient);
        assert_eq!(classify_failure(None, "The model is overloaded"), FailureKind::Transient);
        assert_eq!(classify_failure(None, "Response blocked by safety filters"), FailureKind::Blocked);
        assert_eq!(classify_failure(Some(400), "Invalid model name"), FailureKind::Terminal);
        assert_eq!(classify_failure(Some(401), "Incorrect API key provided"), FailureKind::Terminal);
    }

    #[test]
    fn test_classify_does_not_match_rate_inside_words() {
        // "generate" and "accurate" contain "rate" but are not rate limits
        assert_eq!(classify_failure(Some(500), "Failed to generate an accurate answer"), FailureKind::Terminal);
    }

    #[test]
    fn test_classify_rate_wording() {
        assert_eq!(classify_failure(None, "Request rate exceeded"), FailureKind::Transient);
        assert_eq!(classify_failure(None, "rate exceeded, slow down"), FailureKind::Transient);
        assert_eq!(classify_failure(Some(400), "HTTP 400: ratelimited"), FailureKind::Transient);
        assert_eq!(classify_failure(None, "rate-limit hit"), FailureKind::Transient);
        assert_eq!(
            classify_failure(
                None,
                "RequestError: error sending request for url \
                 (http://127.0.0.1:9/v1beta/models/gemini-2.5-flash:generateContent)"
            ),
            FailureKind::Terminal
        );
        assert_eq!(classify_failure(Some(500), "HTTP 500: code 14290 failed"), FailureKind::Terminal);
    }

    #[test]
    fn test_failure_kind_into_outcome() {
        assert_eq!(
            FailureKind::Transient.into_outcome("busy"),
            CallOutcome::TransientFailure { message: "busy".to_string() }
        );
        assert_eq!(
            FailureKind::Blocked.into_outcome("blocked"),
            CallOutcome::Blocked { finish_reason: None }
        );
    }

    #[test]
    fn test_openai_delays_double_without_jitter() {
        let policy = BackoffPolicy::openai();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_gemini_delays_are_jittered_and_capped() {
        let policy = BackoffPolicy::gemini();
        for attempt in 0..5 {
            let base = Duration::from_secs(1 << attempt);
            let delay = policy.delay_for(attempt);
            assert!(delay >= base, "attempt {attempt}: {delay:?} < {base:?}");
            assert!(delay < base + Duration::from_secs(1), "attempt {attempt}: {delay:?} too long");
        }
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_final_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = flaky_client(5, calls.clone());
        let controller = RetryController::new(BackoffPolicy::gemini());

        let result = controller.call(&client, "Hva er islam?", "gemini-2.5-flash").await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(result.response_text, "Svar");
        assert!(result.error.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_n_minus_one_failures_need_exactly_n_attempts() {
        for failures in 0..3u32 {
            let calls = Arc::new(AtomicU32::new(0));
            let client = flaky_client(failures, calls.clone());
            let controller = RetryController::new(BackoffPolicy::openai());

            let result = controller.call(&client, "p", "gpt-5").await;

            assert_eq!(calls.load(Ordering::SeqCst), failures + 1);
            assert_eq!(result.response_text, "Svar");
            assert_eq!(result.usage.total(), Some(12));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_sentinel_after_max_attempts() {
        let mut client = MockProviderClient::new();
        client.expect_provider().return_const(ProviderId::OpenAI);
        client.expect_generate().times(3).returning(|_, _| rate_limited());
        let controller = RetryController::new(BackoffPolicy::openai());

        let started = tokio::time::Instant::now();
        let result = controller.call(&client, "p", "gpt-5").await;

        assert_eq!(result.response_text, sentinel::RETRIES_EXHAUSTED);
        assert!(result.error.is_empty());
        // 1s + 2s between the three attempts, nothing after the last one
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_terminal_failure_is_not_retried() {
        let mut client = MockProviderClient::new();
        client.expect_provider().return_const(ProviderId::OpenAI);
        client.expect_generate().times(1).returning(|_, _| CallOutcome::TerminalFailure {
            message: "HTTP 404: model not found".to_string(),
        });
        let controller = RetryController::new(BackoffPolicy::openai());

        let result = controller.call(&client, "p", "gpt-x").await;

        assert_eq!(result.response_text, sentinel::ERROR);
        assert_eq!(result.error, "HTTP 404: model not found");
    }

    #[tokio::test]
    async fn test_blocked_is_a_successful_terminal_result() {
        let mut client = MockProviderClient::new();
        client.expect_provider().return_const(ProviderId::Gemini);
        client.expect_generate().times(1).returning(|_, _| CallOutcome::Blocked {
            finish_reason: Some("SAFETY".to_string()),
        });
        let controller = RetryController::new(BackoffPolicy::gemini());

        let result = controller.call(&client, "p", "gemini-2.5-flash").await;

        assert!(result.error.is_empty());
        assert_eq!(result.response_text, "[EMPTY_OR_BLOCKED finish_reason=SAFETY]");
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_still_calls_once() {
        let mut client = MockProviderClient::new();
        client.expect_provider().return_const(ProviderId::Gemini);
        client.expect_generate().times(1).returning(|_, _| answer("ok"));
        let mut policy = BackoffPolicy::gemini();
        policy.max_attempts = 0;

        let result = RetryController::new(policy).call(&client, "p", "m").await;
        assert_eq!(result.response_text, "ok");
    }
}
