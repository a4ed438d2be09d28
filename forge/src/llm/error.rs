//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while generating text
///
/// Every variant is recoverable from the wizard's point of view: the user
/// repeats the action that triggered the request.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Attachment type {mime_type} is not supported by {provider}")]
    UnsupportedAttachment { provider: String, mime_type: String },

    #[error("Unknown LLM provider: '{0}'. Supported: gemini, anthropic")]
    UnknownProvider(String),
}
