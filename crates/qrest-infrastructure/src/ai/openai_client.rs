//! OpenAI-compatible chat completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use qrest_core::error::DomainError;
use qrest_core::ports::{AiProvider, Completion, CompletionRequest, ModelTier};
use qrest_shared::config::AiSettings;

#[derive(Error, Debug)]
pub enum LlmClientError {
    #[error("AI API key is not configured")]
    NotConfigured,

    #[error("Failed to call AI API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("AI API returned no choices")]
    EmptyResponse,
}

impl From<LlmClientError> for DomainError {
    fn from(err: LlmClientError) -> Self {
        match err {
            LlmClientError::NotConfigured => DomainError::AiUnavailable(err.to_string()),
            // Unreachable or timed out; a body that fails to decode is the provider's fault
            LlmClientError::Transport(ref e) if !e.is_decode() => {
                DomainError::AiUnavailable(err.to_string())
            }
            LlmClientError::Status { status, .. } if status == 429 || status >= 500 => {
                DomainError::AiUnavailable(err.to_string())
            }
            _ => DomainError::AiProviderError(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: i64,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    settings: AiSettings,
}

impl OpenAiClient {
    pub fn new(settings: AiSettings) -> Result<Self, LlmClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self { client, settings })
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Default => &self.settings.default_model,
            ModelTier::Advanced => &self.settings.advanced_model,
        }
    }

    async fn chat(&self, request: &CompletionRequest) -> Result<Completion, LlmClientError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmClientError::NotConfigured)?;
        let model = self.model_for(request.tier);

        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_response.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!("Calling AI model {} ({} max tokens)", model, request.max_tokens);
        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.settings.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("AI API returned {}", status);
            return Err(LlmClientError::Status { status, body });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmClientError::EmptyResponse)?;

        Ok(Completion {
            content: content.trim().to_string(),
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, DomainError> {
        Ok(self.chat(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String, api_key: Option<&str>) -> AiSettings {
        AiSettings {
            base_url,
            api_key: api_key.map(String::from),
            default_model: "gpt-3.5-turbo".into(),
            advanced_model: "gpt-4".into(),
            timeout_seconds: 5,
        }
    }

    fn request(tier: ModelTier, json_response: bool) -> CompletionRequest {
        CompletionRequest {
            prompt: "Describe a lentil soup".into(),
            tier,
            max_tokens: 200,
            temperature: 0.7,
            json_response,
        }
    }

    #[tokio::test]
    async fn test_completion_parses_content_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-3.5-turbo", "max_tokens": 200 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-3.5-turbo-0125",
                "choices": [{ "message": { "role": "assistant", "content": "  Warm and earthy.  " } }],
                "usage": { "prompt_tokens": 20, "completion_tokens": 30, "total_tokens": 50 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(server.uri(), Some("sk-test"))).unwrap();
        let completion = client.complete(request(ModelTier::Default, false)).await.unwrap();
        assert_eq!(completion.content, "Warm and earthy.");
        assert_eq!(completion.tokens_used, 50);
        assert_eq!(completion.model, "gpt-3.5-turbo-0125");
    }

    #[tokio::test]
    async fn test_advanced_tier_requests_json_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"categories\":[]}" } }]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(server.uri(), Some("sk-test"))).unwrap();
        let completion = client.complete(request(ModelTier::Advanced, true)).await.unwrap();
        assert_eq!(completion.content, "{\"categories\":[]}");
        assert_eq!(completion.tokens_used, 0);
        assert_eq!(completion.model, "gpt-4");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let client = OpenAiClient::new(settings("http://127.0.0.1:9".into(), None)).unwrap();
        let err = client.complete(request(ModelTier::Default, false)).await.unwrap_err();
        assert!(matches!(err, DomainError::AiUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let client = OpenAiClient::new(settings("http://127.0.0.1:1".into(), Some("sk-test"))).unwrap();
        let err = client.complete(request(ModelTier::Default, false)).await.unwrap_err();
        assert!(matches!(err, DomainError::AiUnavailable(_)));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(server.uri(), Some("sk-test"))).unwrap();
        let err = client.complete(request(ModelTier::Default, false)).await.unwrap_err();
        assert!(matches!(err, DomainError::AiProviderError(_)));
    }

    #[tokio::test]
    async fn test_upstream_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(server.uri(), Some("sk-test"))).unwrap();
        let err = client.complete(request(ModelTier::Default, false)).await.unwrap_err();
        assert!(matches!(err, DomainError::AiUnavailable(_)));
    }

    #[tokio::test]
    async fn test_bad_request_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad prompt"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(server.uri(), Some("sk-test"))).unwrap();
        let err = client.complete(request(ModelTier::Default, false)).await.unwrap_err();
        assert!(err.to_string().contains("400"));
        assert!(matches!(err, DomainError::AiProviderError(_)));
    }
}
