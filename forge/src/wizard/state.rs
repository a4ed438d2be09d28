//! Session state for one wizard run
//!
//! Pure data. Readers get accessors; only the controller (via the
//! `pub(super)` mutators) changes anything.

use serde::Serialize;

/// Where the conversation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Collecting the project form
    #[default]
    Initial,
    /// Model is asking clarifying questions
    Clarifying,
    /// A suggestion exists (or is being generated) and awaits approval
    Suggesting,
    /// A change request is being applied to the suggestion
    Refining,
    /// The final proposal exists (or is being generated)
    Final,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Clarifying => write!(f, "clarification"),
            Self::Suggesting => write!(f, "suggestion"),
            Self::Refining => write!(f, "refining"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Who a chat message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Progress notes shown in the log but never sent to the model
    Status,
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Status,
            text: text.into(),
        }
    }
}

/// Render the conversation for a prompt: `AI:`/`User:` lines, status entries dropped
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter_map(|m| match m.role {
            ChatRole::User => Some(format!("User: {}", m.text)),
            ChatRole::Assistant => Some(format!("AI: {}", m.text)),
            ChatRole::Status => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The single mutable state of a wizard session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    step: Step,
    messages: Vec<ChatMessage>,
    suggestion_draft: Option<String>,
    final_document: Option<String>,
    clarification_rounds: u8,
    loading: bool,
    last_error: Option<String>,
}

impl SessionState {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn suggestion_draft(&self) -> Option<&str> {
        self.suggestion_draft.as_deref()
    }

    pub fn final_document(&self) -> Option<&str> {
        self.final_document.as_deref()
    }

    pub fn clarification_rounds(&self) -> u8 {
        self.clarification_rounds
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of messages with the given role
    pub fn count_role(&self, role: ChatRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub(super) fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    pub(super) fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub(super) fn set_suggestion_draft(&mut self, draft: String) {
        self.suggestion_draft = Some(draft);
    }

    pub(super) fn set_final_document(&mut self, document: String) {
        self.final_document = Some(document);
    }

    pub(super) fn increment_rounds(&mut self) {
        self.clarification_rounds += 1;
    }

    pub(super) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(super) fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
    }
}
