//! Error types for seoforge.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using seoforge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for seoforge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Text generation failed for a single entity
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationFailure),

    /// The host rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

/// Why a synthesis attempt produced no draft.
///
/// These never abort a sweep; the caller logs them and moves on to the
/// next entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    /// Generation is switched off by configuration.
    #[error("generation is disabled")]
    Disabled,

    /// No API credential configured for the endpoint.
    #[error("missing API credential")]
    MissingCredential,

    /// Endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {message}")]
    Transport { status: u16, message: String },

    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The call exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Empty or non-JSON response content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerationFailure {
    /// Stable tag for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::MissingCredential => "missing_credential",
            Self::Transport { .. } => "transport",
            Self::Request(_) => "request",
            Self::Timeout(_) => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("api::page.page#abc".to_string());
        assert_eq!(err.to_string(), "Not found: api::page.page#abc");
    }

    #[test]
    fn test_error_display_persistence() {
        let err = Error::Persistence("update rejected".to_string());
        assert_eq!(err.to_string(), "Persistence error: update rejected");
    }

    #[test]
    fn test_error_display_generation() {
        let err = Error::from(GenerationFailure::MissingCredential);
        assert_eq!(err.to_string(), "Generation failed: missing API credential");
    }

    #[test]
    fn test_generation_failure_transport_display() {
        let failure = GenerationFailure::Transport {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(failure.to_string(), "endpoint returned 429: rate limited");
        assert_eq!(failure.reason(), "transport");
    }

    #[test]
    fn test_generation_failure_reasons_are_distinct() {
        let reasons = [
            GenerationFailure::Disabled.reason(),
            GenerationFailure::MissingCredential.reason(),
            GenerationFailure::Request("x".into()).reason(),
            GenerationFailure::Timeout(Duration::from_secs(1)).reason(),
            GenerationFailure::InvalidResponse("x".into()).reason(),
        ];
        let unique: std::collections::HashSet<_> = reasons.iter().collect();
        assert_eq!(unique.len(), reasons.len());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
