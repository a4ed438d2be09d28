//! Wizard error types

use thiserror::Error;

use super::state::Step;
use crate::llm::LlmError;

/// Errors raised by conversation controller operations
///
/// All variants are recoverable: the session stays usable and the user can
/// fix the input or repeat the action.
#[derive(Debug, Error)]
pub enum WizardError {
    /// Required form input is missing or unreadable
    #[error("{0}")]
    Validation(String),

    /// The provider call failed
    #[error("{message}")]
    Generation {
        /// User-facing summary of the failed action
        message: String,
        #[source]
        source: LlmError,
    },

    /// The model answered but left out required sections
    #[error("The suggestion is missing required sections: {}", missing.join(", "))]
    MalformedSuggestion { missing: Vec<String> },

    /// A prompt template failed to load or render
    #[error("Prompt template error: {0}")]
    Prompt(String),

    /// Another request is still in flight
    #[error("A request is already in progress")]
    Busy,

    /// The action is not available in the current step
    #[error("Cannot {action} while in the {step} step")]
    InvalidStep { action: &'static str, step: Step },
}

impl WizardError {
    /// Wrap a gateway failure with the user-facing message for the action
    pub fn generation(message: impl Into<String>, source: LlmError) -> Self {
        Self::Generation {
            message: message.into(),
            source,
        }
    }

    /// Text shown to the user in the error banner
    ///
    /// Generation failures include the provider detail after the summary.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation { message, source } => format!("{} ({})", message, source),
            other => other.to_string(),
        }
    }
}
