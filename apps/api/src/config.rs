use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::openai::Endpoint;
use crate::llm_client::{
    CompletionClient, OpenAiProvider, RetryPolicy, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_RETRIES,
};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Azure => "azure",
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Every LLM setting is optional: without credentials the service runs in
/// keyword-only mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: String,
    pub model: String,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset, as an empty key in .env usually means "not configured"
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            openai_api_key: optional("OPENAI_API_KEY"),
            azure_api_key: optional("AZURE_OPENAI_API_KEY"),
            azure_endpoint: optional("AZURE_OPENAI_ENDPOINT"),
            azure_deployment: optional("AZURE_OPENAI_DEPLOYMENT"),
            azure_api_version: optional("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            model: optional("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_retries: parse_or(
                "LLM_MAX_RETRIES",
                optional("LLM_MAX_RETRIES"),
                DEFAULT_MAX_RETRIES,
            )?,
            initial_backoff: Duration::from_secs(parse_or(
                "LLM_INITIAL_BACKOFF_SECS",
                optional("LLM_INITIAL_BACKOFF_SECS"),
                DEFAULT_INITIAL_BACKOFF.as_secs(),
            )?),
            port: parse_or("PORT", optional("PORT"), 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// `openai` when an OpenAI key is present, otherwise `azure`.
    pub fn provider(&self) -> Provider {
        if self.openai_api_key.is_some() {
            Provider::OpenAi
        } else {
            Provider::Azure
        }
    }

    /// Whether enough credentials are present to call an LLM at all.
    pub fn api_ready(&self) -> bool {
        match self.provider() {
            Provider::OpenAi => true,
            Provider::Azure => {
                self.azure_api_key.is_some()
                    && self.azure_endpoint.is_some()
                    && self.azure_deployment.is_some()
            }
        }
    }

    /// Azure deployment name, else the model id.
    pub fn deployment_label(&self) -> &str {
        self.azure_deployment.as_deref().unwrap_or(&self.model)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: self.initial_backoff,
        }
    }

    /// Endpoint and key for the selected provider, or `None` in keyword-only mode.
    fn endpoint(&self) -> Option<(Endpoint, String)> {
        if let Some(key) = &self.openai_api_key {
            return Some((Endpoint::OpenAi, key.clone()));
        }

        match (
            &self.azure_api_key,
            &self.azure_endpoint,
            &self.azure_deployment,
        ) {
            (Some(key), Some(base_url), Some(deployment)) => Some((
                Endpoint::Azure {
                    base_url: base_url.clone(),
                    deployment: deployment.clone(),
                    api_version: self.azure_api_version.clone(),
                },
                key.clone(),
            )),
            _ => None,
        }
    }

    /// Completion client for the configured provider, or `None` when no credentials are set.
    pub fn completion_client(&self) -> Result<Option<CompletionClient>> {
        let Some((endpoint, api_key)) = self.endpoint() else {
            return Ok(None);
        };

        let provider =
            OpenAiProvider::new(endpoint, api_key).context("Failed to build HTTP client")?;
        let client = CompletionClient::new(Arc::new(provider), self.model.clone())
            .with_retry_policy(self.retry_policy());

        Ok(Some(client))
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
