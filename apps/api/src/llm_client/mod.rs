//! LLM Client: the single point of entry for all chat-completion calls.
//!
//! No other module talks to a provider directly. Callers hold a `CompletionClient`,
//! which owns the model id and retry policy and delegates the wire call to a
//! `CompletionProvider` (OpenAI or Azure OpenAI in production, scripted in tests).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod openai;

pub use openai::OpenAiProvider;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(5);

/// Failure reported by a provider for a single attempt.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Rate limit reached: {message}")]
    RateLimited { message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// Only rate-limit failures are worth retrying.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// Final outcome of `CompletionClient::complete` when no completion was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// A non-retryable provider failure, carrying its description.
    #[error("{0}")]
    Provider(String),

    #[error("Rate limit exceeded after retries.")]
    RetriesExhausted { attempts: u32 },
}

// ────────────────────────────────────────────────────────────────────────────
// Response shape (OpenAI chat completions)
// ────────────────────────────────────────────────────────────────────────────

/// Raw chat-completion response. Every field is optional so that a response with
/// missing parts still deserializes and can be reported as malformed; a body that
/// does not deserialize at all becomes `ChatCompletion::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    pub message: Option<AssistantMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletion {
    /// Message content of the first choice, if the response carries one.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider trait
// ────────────────────────────────────────────────────────────────────────────

/// One chat-completion attempt against an external endpoint.
///
/// Carried by `CompletionClient` as `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ChatCompletion, ProviderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Client with retry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    retry: RetryPolicy,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the system and user prompts, retrying rate-limited attempts with
    /// exponential backoff (5s, 10s, 20s, ... by default).
    ///
    /// Any other provider failure is returned immediately without retry. There is no
    /// wait after the final rate-limited attempt, so five attempts sleep 75s in total.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ChatCompletion, CompletionError> {
        let mut backoff = self.retry.initial_backoff;

        for attempt in 1..=self.retry.max_retries {
            let err = match self
                .provider
                .chat(&self.model, system_prompt, user_prompt)
                .await
            {
                Ok(completion) => {
                    if let Some(usage) = &completion.usage {
                        debug!(
                            "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                            usage.prompt_tokens, usage.completion_tokens
                        );
                    }
                    return Ok(completion);
                }
                Err(e) => e,
            };

            if !err.is_rate_limit() {
                warn!("LLM call failed without retry: {err}");
                return Err(CompletionError::Provider(err.to_string()));
            }

            if attempt == self.retry.max_retries {
                break;
            }

            warn!(
                "LLM attempt {}/{} rate limited, retrying after {}s...",
                attempt,
                self.retry.max_retries,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }

        Err(CompletionError::RetriesExhausted {
            attempts: self.retry.max_retries,
        })
    }
}

/// Doubles the wait, capped at `Duration::MAX` for absurd configured backoffs.
fn next_backoff(backoff: Duration) -> Duration {
    backoff.saturating_mul(2)
}
