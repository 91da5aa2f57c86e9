//! Classification of non-success responses.

use seoforge_core::GenerationFailure;

/// Coarse error class of a non-success response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Prompt exceeded the model's context window.
    ContextLengthExceeded,
    ServerError,
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Whether a later attempt by the scheduler may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationError => "authentication",
            Self::RateLimitExceeded => "rate_limit",
            Self::ModelNotFound => "model_not_found",
            Self::ContextLengthExceeded => "context_length",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        }
    }
}

/// Convert a non-success response into a [`GenerationFailure`].
pub fn to_generation_failure(status: u16, message: &str) -> GenerationFailure {
    GenerationFailure::Transport {
        status,
        message: message.to_string(),
    }
}
