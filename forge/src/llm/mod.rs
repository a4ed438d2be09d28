//! LLM gateway
//!
//! A thin adapter between the wizard and a hosted model: one stateless
//! `generate` call per step, with optional web search and inline attachments.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use types::{GenerateRequest, Part};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// The API key is resolved by the caller so a missing key surfaces as a
/// configuration error rather than a generation error.
pub fn create_client(config: &LlmConfig, api_key: String) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model(), "create_client: called");
    match config.provider.as_str() {
        "gemini" => {
            debug!("create_client: creating Gemini client");
            Ok(Arc::new(GeminiClient::from_config(config, api_key)?))
        }
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config, api_key)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnknownProvider(other.to_string()))
        }
    }
}
