//! # seoforge-inference
//!
//! Text-generation backends and AI metadata synthesis for seoforge.
//!
//! This crate provides:
//! - OpenAI-compatible chat-completions backend (feature `openai`, default)
//! - Prompt construction with a literal output shape
//! - [`AiMetadataSynthesizer`]: context, prompt, bounded generation call and
//!   fenced-JSON parsing into a [`seoforge_core::RawDraft`]
//! - Deterministic mock backend (feature `mock`)
//!
//! # Feature Flags
//!
//! - `openai` (default): Enable the OpenAI-compatible backend
//! - `mock`: Export [`mock::MockGenerationBackend`] for downstream tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use seoforge_core::{ContentKind, SeoConfig, SeoContextBuilder};
//! use seoforge_inference::{AiMetadataSynthesizer, OpenAIBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SeoConfig::from_env();
//!     let backend = OpenAIBackend::new(config.generation.clone()).unwrap();
//!     let synthesizer = AiMetadataSynthesizer::new(
//!         Arc::new(backend),
//!         config.generation.clone(),
//!         SeoContextBuilder::new(config.context.clone(), config.base_paths.clone()),
//!     );
//!     let entity = serde_json::json!({"title": "About us", "slug": "about-us"});
//!     let result = synthesizer
//!         .synthesize(&entity, ContentKind::Page, "page", Some("https://example.com"))
//!         .await;
//! }
//! ```

pub mod prompt;
pub mod synthesizer;

#[cfg(feature = "openai")]
pub mod openai;

// Mock generation backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use prompt::{PromptBuilder, SYSTEM_MESSAGE};
pub use synthesizer::{parse_ai_json, AiMetadataSynthesizer, Synthesis};

#[cfg(feature = "openai")]
pub use openai::OpenAIBackend;

// Re-export core types for convenience
pub use seoforge_core::{GenerationBackend, GenerationFailure};
