//! Anthropic Claude API client implementation
//!
//! Implements the LlmClient trait for Anthropic's Messages API. Document
//! attachments map to `document`/`image` content blocks and the search flag
//! enables the server-side web search tool.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{GenerateRequest, LlmClient, LlmError, Part};
use crate::config::LlmConfig;

/// Upper bound on web searches per request
const MAX_SEARCH_USES: u32 = 5;

/// Anthropic Claude API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a new client from configuration and a resolved API key
    pub fn from_config(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        debug!(model = %config.model(), "AnthropicClient::from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model(),
            api_key,
            base_url: config.base_url(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &GenerateRequest) -> Result<serde_json::Value, LlmError> {
        debug!(%self.model, enable_search = request.enable_search, "build_request_body: called");
        let content = request
            .parts
            .iter()
            .map(|part| self.convert_part(part))
            .collect::<Result<Vec<_>, _>>()?;

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": content,
            }],
        });

        if request.enable_search {
            debug!("build_request_body: adding web search tool");
            body["tools"] = serde_json::json!([{
                "type": "web_search_20250305",
                "name": "web_search",
                "max_uses": MAX_SEARCH_USES,
            }]);
        }

        Ok(body)
    }

    /// Convert a prompt part to an Anthropic content block
    fn convert_part(&self, part: &Part) -> Result<serde_json::Value, LlmError> {
        match part {
            Part::Text(text) => Ok(serde_json::json!({
                "type": "text",
                "text": text,
            })),
            Part::InlineData { mime_type, data } if mime_type == "application/pdf" => Ok(serde_json::json!({
                "type": "document",
                "source": {
                    "type": "base64",
                    "media_type": mime_type,
                    "data": data,
                },
            })),
            Part::InlineData { mime_type, data } if mime_type.starts_with("image/") => Ok(serde_json::json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": mime_type,
                    "data": data,
                },
            })),
            Part::InlineData { mime_type, data } if mime_type.starts_with("text/") => {
                // Plain-text documents travel as text sources, not base64
                let bytes = BASE64_STANDARD
                    .decode(data)
                    .map_err(|e| LlmError::InvalidResponse(format!("Attachment is not valid base64: {e}")))?;
                Ok(serde_json::json!({
                    "type": "document",
                    "source": {
                        "type": "text",
                        "media_type": "text/plain",
                        "data": String::from_utf8_lossy(&bytes),
                    },
                }))
            }
            Part::InlineData { mime_type, .. } => {
                debug!(%mime_type, "convert_part: unsupported attachment");
                Err(LlmError::UnsupportedAttachment {
                    provider: "anthropic".to_string(),
                    mime_type: mime_type.clone(),
                })
            }
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
        debug!(%self.model, "AnthropicClient::generate: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(&request)?;

        let response = self
            .http
            .post(url)
            .header("x-api-key", self.api_key.clone())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("AnthropicClient::generate: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "AnthropicClient::generate: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let api_response: AnthropicResponse = response.json().await?;
        let text = collect_text(api_response)?;
        info!(model = %self.model, chars = text.len(), "Anthropic generation complete");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Concatenate every text block; search results and tool blocks are skipped
fn collect_text(response: AnthropicResponse) -> Result<String, LlmError> {
    debug!(?response.stop_reason, block_count = response.content.len(), "collect_text: called");
    let text: String = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect();

    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("Anthropic API returned no text".to_string()));
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}
