//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::wizard::{CLARIFICATION_SENTINEL, ProjectInput};

/// One prompt per kind of wizard request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Ask a clarifying question or answer with the sentinel
    Clarify,
    /// Suggest a project from the form and conversation
    Suggest,
    /// Suggest a project from a reference URL using web search
    SuggestFromUrl,
    /// Rewrite the suggestion for a change request
    Refine,
    /// Expand the approved suggestion into the final proposal
    Proposal,
}

impl Template {
    /// File stem of the template (`{name}.pmt`)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clarify => "clarify",
            Self::Suggest => "suggest",
            Self::SuggestFromUrl => "suggest-url",
            Self::Refine => "refine",
            Self::Proposal => "proposal",
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Context for rendering prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub project_name: String,
    pub skills: String,
    pub experience_level: String,
    pub reference_url: Option<String>,
    /// File name of the attached reference document
    pub reference_document: Option<String>,
    /// `AI:`/`User:` transcript, empty when there is no history
    pub conversation: String,
    pub previous_suggestion: Option<String>,
    pub change_request: Option<String>,
    pub sentinel: &'static str,
}

impl PromptContext {
    /// Context carrying the form fields
    pub fn from_input(input: &ProjectInput) -> Self {
        debug!(project_name = %input.project_name, "PromptContext::from_input: called");
        Self {
            project_name: input.project_name.clone(),
            skills: input.skills.clone(),
            experience_level: input.experience_level.to_string(),
            reference_url: input.reference_url.clone(),
            reference_document: input.reference_document.as_ref().map(|d| d.name.clone()),
            conversation: String::new(),
            previous_suggestion: None,
            change_request: None,
            sentinel: CLARIFICATION_SENTINEL,
        }
    }

    pub fn with_conversation(mut self, conversation: impl Into<String>) -> Self {
        self.conversation = conversation.into();
        self
    }

    pub fn with_previous_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.previous_suggestion = Some(suggestion.into());
        self
    }

    pub fn with_change_request(mut self, change_request: impl Into<String>) -> Self {
        self.change_request = Some(change_request.into());
        self
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Project override directory (`.projectforge/prompts/`)
    project_dir: Option<PathBuf>,
    /// User override directory (`~/.config/projectforge/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at the given working directory
    pub fn new(worktree: impl AsRef<Path>) -> Self {
        let worktree = worktree.as_ref();
        debug!(?worktree, "PromptLoader::new: called");
        let project_dir = Some(worktree.join(".projectforge/prompts")).filter(|d| d.is_dir());
        let user_dir = dirs::config_dir()
            .map(|d| d.join("projectforge/prompts"))
            .filter(|d| d.is_dir());
        debug!(?project_dir, ?user_dir, "PromptLoader::new: override directories");

        Self {
            hbs: Self::engine(),
            project_dir,
            user_dir,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            project_dir: None,
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; user input must reach the model unescaped.
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Project override: `.projectforge/prompts/{name}.pmt`
    /// 2. User override: `~/.config/projectforge/prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.project_dir, &self.user_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: using embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template: Template, context: &PromptContext) -> Result<String> {
        debug!(%template, project_name = %context.project_name, "PromptLoader::render: called");
        let source = self.load_template(template.name())?;
        info!("Rendering template '{}' for {}", template, context.project_name);
        self.hbs
            .render_template(&source, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template, e))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}
