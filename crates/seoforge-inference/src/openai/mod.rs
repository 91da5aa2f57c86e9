//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint that speaks the chat-completions protocol:
//!
//! - OpenAI cloud API
//! - Azure OpenAI
//! - Ollama (in OpenAI compatibility mode)
//! - vLLM, LocalAI, LM Studio
//!
//! # Example
//!
//! ```rust,no_run
//! use seoforge_core::{GenerationBackend, GenerationConfig};
//! use seoforge_inference::openai::OpenAIBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     // From environment variables
//!     let backend = OpenAIBackend::from_env().unwrap();
//!
//!     // Or with custom config
//!     let config = GenerationConfig {
//!         endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
//!         api_key: Some("ollama".to_string()),
//!         model: "llama3".to_string(),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let json = backend.generate("Return {} as JSON").await;
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::OpenAIBackend;
pub use error::{to_generation_failure, OpenAIErrorCode};
pub use types::*;
