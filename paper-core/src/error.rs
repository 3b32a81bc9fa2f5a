//! Error types for the backend

use thiserror::Error;

use crate::provider::Provider;

/// Backend-wide error type
#[derive(Error, Debug)]
pub enum PaperError {
    /// Malformed client input; rejected before any dispatch
    #[error("Client error: {0}")]
    Client(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// One provider failed; siblings in a fan-out are unaffected
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: Provider, message: String },

    /// Every provider in a dispatch failed
    #[error("All providers failed: {0}")]
    Aggregate(String),

    #[error("Advisor error: {0}")]
    Advisor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaperError {
    pub fn client(msg: impl Into<String>) -> Self {
        PaperError::Client(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        PaperError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        PaperError::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        PaperError::Parse(msg.into())
    }

    pub fn provider(provider: Provider, message: impl Into<String>) -> Self {
        PaperError::Provider {
            provider,
            message: message.into(),
        }
    }

    pub fn aggregate(msg: impl Into<String>) -> Self {
        PaperError::Aggregate(msg.into())
    }

    pub fn advisor(msg: impl Into<String>) -> Self {
        PaperError::Advisor(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        PaperError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        PaperError::Internal(msg.into())
    }

    /// True for errors caused by the caller rather than the backend
    pub fn is_client(&self) -> bool {
        matches!(self, PaperError::Client(_))
    }
}

/// Result type alias for backend operations
pub type PaperResult<T> = Result<T, PaperError>;
