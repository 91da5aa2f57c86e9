//! OpenAI-compatible chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use seoforge_core::{Error, GenerationBackend, GenerationConfig, GenerationFailure, Result, SeoConfig};

use super::error::{to_generation_failure, OpenAIErrorCode};
use super::types::*;

/// OpenAI-compatible generation backend.
///
/// `config.endpoint` is the full chat-completions URL, so any compatible
/// server (OpenAI, Azure, Ollama, vLLM) can be targeted.
pub struct OpenAIBackend {
    client: Client,
    config: GenerationConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing OpenAI backend: endpoint={}, model={}, credential={}",
            config.endpoint,
            config.model,
            if config.api_key.is_some() { "set" } else { "missing" }
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(GenerationConfig::default())
    }

    /// Create from environment variables (see [`SeoConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::new(SeoConfig::from_env().generation)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn build_request(&self, api_key: &str) -> reqwest::RequestBuilder {
        self.client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
    }

    fn chat_request(&self, system: &str, prompt: &str) -> ChatCompletionRequest {
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    fn send_failure(&self, e: reqwest::Error) -> GenerationFailure {
        if e.is_timeout() {
            GenerationFailure::Timeout(self.config.timeout)
        } else {
            GenerationFailure::Request(e.to_string())
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> std::result::Result<String, GenerationFailure> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationFailure::MissingCredential)?;

        debug!(
            "Generating with model {}, prompt length: {}",
            self.config.model,
            prompt.len()
        );

        let response = self
            .build_request(api_key)
            .json(&self.chat_request(system, prompt))
            .send()
            .await
            .map_err(|e| self.send_failure(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: OpenAIErrorResponse = response.json().await.unwrap_or(OpenAIErrorResponse {
                error: OpenAIError {
                    message: "Unknown error".to_string(),
                    error_type: None,
                    code: None,
                },
            });
            let code =
                OpenAIErrorCode::from_response(status, body.error.error_type.as_deref().unwrap_or(""));
            warn!(
                status,
                class = code.as_str(),
                retryable = code.is_retryable(),
                "Generation endpoint returned {}: {}",
                status,
                body.error.message
            );
            return Err(to_generation_failure(status, &body.error.message));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationFailure::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = result
            .first_content()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GenerationFailure::InvalidResponse("empty response".to_string()))?
            .to_string();

        debug!("Generation complete, response length: {}", content.len());
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn provider_name(&self) -> &str {
        &self.config.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_backend_creation() {
        let backend = OpenAIBackend::with_defaults().unwrap();
        assert_eq!(
            backend.config().endpoint,
            seoforge_core::defaults::GENERATION_ENDPOINT
        );
        assert!(backend.config().api_key.is_none());
    }

    #[test]
    fn test_model_and_provider_accessors() {
        let config = GenerationConfig {
            model: "custom-gen".to_string(),
            provider: "azure".to_string(),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        assert_eq!(backend.model_name(), "custom-gen");
        assert_eq!(backend.provider_name(), "azure");
    }

    #[test]
    fn test_chat_request_shape() {
        let config = GenerationConfig {
            temperature: 0.2,
            max_tokens: 300,
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        let request = backend.chat_request("sys", "user prompt");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
    }

    #[test]
    fn test_chat_request_without_system() {
        let backend = OpenAIBackend::with_defaults().unwrap();
        let request = backend.chat_request("", "only user");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_request() {
        let config = GenerationConfig {
            endpoint: "http://127.0.0.1:9/never".to_string(),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        let err = backend.generate("x").await.unwrap_err();
        assert_eq!(err, GenerationFailure::MissingCredential);
    }
}
