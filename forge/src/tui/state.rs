//! TUI state - everything the views need that is not session state
//!
//! Session state lives in the `Wizard`; this module holds the form being
//! edited, the text input buffer, scroll position and transient notices.

use std::path::PathBuf;

use tracing::debug;

use crate::wizard::{ExperienceLevel, ProjectInput, ReferenceDocument, WizardError};

/// Spinner frames shown while a request is in flight
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Which form field has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Skills,
    Level,
    Url,
    Document,
}

impl FormField {
    pub const ALL: [FormField; 5] = [Self::Name, Self::Skills, Self::Level, Self::Url, Self::Document];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Project Name",
            Self::Skills => "Skills to Learn",
            Self::Level => "Experience Level",
            Self::Url => "Reference URL (optional)",
            Self::Document => "Reference Document path (optional)",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Skills,
            Self::Skills => Self::Level,
            Self::Level => Self::Url,
            Self::Url => Self::Document,
            Self::Document => Self::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Name => Self::Document,
            Self::Skills => Self::Name,
            Self::Level => Self::Skills,
            Self::Url => Self::Level,
            Self::Document => Self::Url,
        }
    }
}

/// The project form as typed so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub skills: String,
    pub level: ExperienceLevel,
    pub url: String,
    pub document: String,
    pub focus: FormField,
}

impl FormState {
    /// Text buffer of the focused field, `None` for the level selector
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Skills => Some(&mut self.skills),
            FormField::Level => None,
            FormField::Url => Some(&mut self.url),
            FormField::Document => Some(&mut self.document),
        }
    }

    /// Display value of a field
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Name => self.name.clone(),
            FormField::Skills => self.skills.clone(),
            FormField::Level => self.level.to_string(),
            FormField::Url => self.url.clone(),
            FormField::Document => self.document.clone(),
        }
    }

    /// Build the project input, reading the reference document if a path was given
    pub fn to_input(&self) -> Result<ProjectInput, WizardError> {
        debug!(name = %self.name, document = %self.document, "FormState::to_input: called");
        let mut input = ProjectInput::new(self.name.trim(), self.skills.trim(), self.level).with_reference_url(&self.url);
        let document = self.document.trim();
        if !document.is_empty() {
            input = input.with_reference_document(ReferenceDocument::load(PathBuf::from(document))?);
        }
        Ok(input)
    }
}

/// Top-level screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Configuration is incomplete; show how to fix it
    Setup { problem: String, instructions: Vec<String> },
    /// The wizard itself; the step decides what is drawn
    Wizard,
}

/// TUI-only state
#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub form: FormState,
    /// Answer or change request being typed
    pub input: String,
    /// Typing a change request in the suggestion step
    pub editing_refinement: bool,
    /// Lines scrolled back from the bottom of the conversation
    pub scroll_back: u16,
    /// Lines scrolled down from the top of the final proposal
    pub doc_scroll: u16,
    /// Spinner animation frame
    pub spinner: usize,
    /// Transient footer message (export results, form errors)
    pub notice: Option<String>,
    /// Model name for the header
    pub model: String,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            screen: Screen::Wizard,
            form: FormState::default(),
            input: String::new(),
            editing_refinement: false,
            scroll_back: 0,
            doc_scroll: 0,
            spinner: 0,
            notice: None,
            model: model.into(),
            should_quit: false,
        }
    }

    /// Setup screen for a configuration problem
    pub fn setup(problem: impl Into<String>, instructions: Vec<String>) -> Self {
        Self {
            screen: Screen::Setup {
                problem: problem.into(),
                instructions,
            },
            ..Self::new("")
        }
    }

    /// Advance animations
    pub fn tick(&mut self) {
        self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner % SPINNER_FRAMES.len()]
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Forget everything typed for the previous project
    pub fn reset_inputs(&mut self) {
        self.form = FormState::default();
        self.input.clear();
        self.editing_refinement = false;
        self.scroll_back = 0;
        self.doc_scroll = 0;
        self.notice = None;
    }
}
