//! OpenAI-compatible chat-completions provider (api.openai.com or an Azure OpenAI deployment).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ChatCompletion, CompletionProvider, ProviderError};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Where requests are sent and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// api.openai.com with `Authorization: Bearer <key>`.
    OpenAi,
    /// `{base_url}/openai/deployments/{deployment}/chat/completions` with an `api-key` header.
    Azure {
        base_url: String,
        deployment: String,
        api_version: String,
    },
}

impl Endpoint {
    pub fn url(&self) -> String {
        match self {
            Endpoint::OpenAi => OPENAI_API_URL.to_string(),
            Endpoint::Azure {
                base_url,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base_url.trim_end_matches('/'),
                deployment,
                api_version
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    endpoint: Endpoint,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(endpoint: Endpoint, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.endpoint {
            Endpoint::OpenAi => request.bearer_auth(&self.api_key),
            Endpoint::Azure { .. } => request.header("api-key", &self.api_key),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ChatCompletion, ProviderError> {
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .authorize(self.client.post(self.endpoint.url()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(parse_completion(&bytes));
        }

        let text = response.text().await.unwrap_or_default();
        warn!("LLM API returned {}: {}", status, text);
        Err(classify_failure(status, text))
    }
}

/// Parses a 2xx body. A body that does not fit the chat-completion shape yields an
/// empty completion, which callers report as malformed rather than as a failure.
pub(crate) fn parse_completion(bytes: &[u8]) -> ChatCompletion {
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        warn!("LLM response did not match the chat-completion shape: {e}");
        ChatCompletion::default()
    })
}

/// Maps a non-2xx response to a provider error, preferring the API's own message.
fn classify_failure(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited { message }
    } else {
        ProviderError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_url() {
        assert_eq!(
            Endpoint::OpenAi.url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_azure_url_trims_trailing_slash() {
        let endpoint = Endpoint::Azure {
            base_url: "https://acme.openai.azure.com/".to_string(),
            deployment: "gpt35".to_string(),
            api_version: "2024-02-01".to_string(),
        };
        assert_eq!(
            endpoint.url(),
            "https://acme.openai.azure.com/openai/deployments/gpt35/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_429_is_rate_limit_with_api_message() {
        let body = r#"{"error":{"message":"Rate limit reached for gpt-3.5-turbo","type":"requests"}}"#;
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, body.to_string());
        assert!(err.is_rate_limit());
        assert_eq!(
            err.to_string(),
            "Rate limit reached: Rate limit reached for gpt-3.5-turbo"
        );
    }

    #[test]
    fn test_other_status_is_not_retryable() {
        let err = classify_failure(StatusCode::BAD_REQUEST, "plain body".to_string());
        assert!(!err.is_rate_limit());
        assert_eq!(err.to_string(), "API error (status 400): plain body");
    }

    #[test]
    fn test_server_error_is_not_retryable() {
        let err = classify_failure(StatusCode::SERVICE_UNAVAILABLE, String::new());
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    }

    #[test]
    fn test_success_body_parsed() {
        let completion = parse_completion(
            br#"{"choices":[{"message":{"role":"assistant","content":"Good fit."}}]}"#,
        );
        assert_eq!(completion.text(), Some("Good fit."));
    }

    #[test]
    fn test_unexpected_success_body_has_no_text() {
        for body in [
            r#"{"choices":null}"#,
            r#"{"choices":[{"message":{"content":["x"]}}]}"#,
            r#"{"choices":[{"message":"hi"}]}"#,
            "<html>ok</html>",
            "",
        ] {
            let completion = parse_completion(body.as_bytes());
            assert!(completion.choices.is_empty(), "body {body}");
            assert_eq!(completion.text(), None, "body {body}");
        }
    }

    #[test]
    fn test_request_serializes_role_tagged_messages() {
        let body = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }
}
