//! Mock generation backend for deterministic testing.
//!
//! Records every call and answers with canned content, optionally after a
//! simulated delay or with a configured failure.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seoforge_core::GenerationBackend;
//! use seoforge_inference::mock::MockGenerationBackend;
//!
//! #[tokio::test]
//! async fn test_with_mock_backend() {
//!     let backend = MockGenerationBackend::new()
//!         .with_fixed_response(r#"{"metaTitle": "Hello"}"#);
//!
//!     let response = backend.generate("prompt").await.unwrap();
//!     assert!(response.contains("Hello"));
//! }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use seoforge_core::{GenerationBackend, GenerationFailure};

/// Mock generation backend for testing.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    /// `(needle, outcome)` pairs checked in insertion order against the prompt.
    mapped: Vec<(String, Result<String, GenerationFailure>)>,
    default_outcome: Result<String, GenerationFailure>,
    latency_ms: u64,
    model: String,
    provider: String,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
    pub timestamp: std::time::Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mapped: Vec::new(),
            default_outcome: Ok("{}".to_string()),
            latency_ms: 0,
            model: "mock-model".to_string(),
            provider: "mock".to_string(),
        }
    }
}

impl MockGenerationBackend {
    /// Create a new mock backend answering `{}`.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response returned when no mapping matches.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_outcome = Ok(response.into());
        self
    }

    /// Fail every unmapped call with `failure`.
    pub fn with_failure(mut self, failure: GenerationFailure) -> Self {
        Arc::make_mut(&mut self.config).default_outcome = Err(failure);
        self
    }

    /// Answer with `response` when the prompt contains `needle`.
    pub fn with_response_for(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .mapped
            .push((needle.into(), Ok(response.into())));
        self
    }

    /// Fail with `failure` when the prompt contains `needle`.
    pub fn with_failure_for(mut self, needle: impl Into<String>, failure: GenerationFailure) -> Self {
        Arc::make_mut(&mut self.config)
            .mapped
            .push((needle.into(), Err(failure)));
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).provider = provider.into();
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.log().clear()
    }

    /// Get number of generation calls.
    pub fn generate_call_count(&self) -> usize {
        self.log().len()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn outcome(&self, prompt: &str) -> Result<String, GenerationFailure> {
        self.config
            .mapped
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| self.config.default_outcome.clone())
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, GenerationFailure> {
        self.log().push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
            timestamp: std::time::Instant::now(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        self.outcome(prompt)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn provider_name(&self) -> &str {
        &self.config.provider
    }
}
