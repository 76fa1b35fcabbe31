//! OpenAiClient implementation.

use llm_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::LlmClientConfig;

/// A completion provider backed by an OpenAI-compatible HTTP API.
///
/// The client holds no conversation state; every call sends the full prompt.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmClientConfig,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmClientConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            model = %config.model,
            timeout_secs = config.timeout.as_secs(),
            "Completion client initialized"
        );

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`LlmClientConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(LlmClientConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LlmClientConfig {
        &self.config
    }

    async fn chat_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| {
            ProviderError::Network(format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let completion = self.chat_completion(&request).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Completion token usage"
            );
        }

        completion
            .first_content()
            .map(str::to_string)
            .ok_or(ProviderError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "OpenAiClient"
    }
}
