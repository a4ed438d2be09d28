//! Provider-agnostic generation request types

use tracing::debug;

/// One piece of a prompt: text or an inline binary attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData {
        /// MIME type as reported by the form collector
        mime_type: String,
        /// Base64-encoded bytes
        data: String,
    },
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    /// Create an inline-data part from already encoded content
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// A complete, self-contained generation request
///
/// The gateway keeps no conversation memory, so every request carries the
/// whole context the model needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateRequest {
    /// Prompt parts in order
    pub parts: Vec<Part>,

    /// Allow the provider's web search tool for this call
    pub enable_search: bool,
}

impl GenerateRequest {
    /// Request consisting of a single text prompt
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(prompt)],
            enable_search: false,
        }
    }

    /// Enable the web search tool
    pub fn with_search(mut self) -> Self {
        debug!("GenerateRequest::with_search: called");
        self.enable_search = true;
        self
    }

    /// Concatenated text of all text parts
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(text) => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any part carries binary data
    pub fn has_attachment(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::InlineData { .. }))
    }
}
