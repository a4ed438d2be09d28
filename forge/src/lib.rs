//! Project Forge - guided LLM wizard for software-learning projects
//!
//! The user describes a project they want to build to learn some skills.
//! The wizard asks up to three clarifying questions, proposes a project,
//! applies change requests, and finally expands the approved suggestion into
//! a full proposal that can be exported as text, JSON or HTML.
//!
//! # Modules
//!
//! - [`wizard`] - Conversation state machine and prompt policy
//! - [`llm`] - Stateless gateway to the hosted model (Gemini, Anthropic)
//! - [`prompts`] - Handlebars prompt templates
//! - [`export`] - Proposal exporters
//! - [`markdown`] - Markdown helpers
//! - [`tui`] - Terminal interface
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod export;
pub mod llm;
pub mod markdown;
pub mod prompts;
pub mod tui;
pub mod wizard;

// Re-export commonly used types
pub use config::{Config, ConfigError, LlmConfig};
pub use export::{ExportError, ExportFormat};
pub use llm::{GenerateRequest, LlmClient, LlmError, create_client};
pub use wizard::{ExperienceLevel, Intent, ProjectInput, SessionState, Step, Wizard, WizardError};
