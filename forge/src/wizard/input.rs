//! Form input for a new project
//!
//! `ProjectInput` is built once by the form collector and handed to the
//! controller, which only ever reads it.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::WizardError;

/// Message shown when a required field is blank
pub const REQUIRED_FIELDS_MESSAGE: &str = "Project Name and Skills to Learn are required.";

/// How much experience the user has with the skills they want to learn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    /// Next level, wrapping around
    pub fn next(self) -> Self {
        match self {
            Self::Beginner => Self::Intermediate,
            Self::Intermediate => Self::Advanced,
            Self::Advanced => Self::Beginner,
        }
    }

    /// Previous level, wrapping around
    pub fn prev(self) -> Self {
        match self {
            Self::Beginner => Self::Advanced,
            Self::Intermediate => Self::Beginner,
            Self::Advanced => Self::Intermediate,
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "Beginner"),
            Self::Intermediate => write!(f, "Intermediate"),
            Self::Advanced => write!(f, "Advanced"),
        }
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(format!("Unknown experience level: {}", s)),
        }
    }
}

/// A reference document attached to the suggestion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    /// File name shown to the user and the model
    pub name: String,
    /// MIME type guessed from the file extension
    pub mime_type: String,
    /// File bytes, base64-encoded for transmission
    pub base64_content: String,
}

impl ReferenceDocument {
    /// Build a document from raw bytes
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            base64_content: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Read and encode a document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WizardError> {
        let path = path.as_ref();
        debug!(?path, "ReferenceDocument::load: called");
        let bytes = std::fs::read(path).map_err(|e| {
            WizardError::Validation(format!("Failed to read reference document {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string();
        debug!(%name, %mime_type, size = bytes.len(), "ReferenceDocument::load: loaded");
        Ok(Self::from_bytes(name, mime_type, &bytes))
    }
}

/// Everything the user told us about the project they want to build
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectInput {
    pub project_name: String,
    pub skills: String,
    pub experience_level: ExperienceLevel,
    pub reference_url: Option<String>,
    pub reference_document: Option<ReferenceDocument>,
}

impl ProjectInput {
    /// Create input with the required fields
    pub fn new(project_name: impl Into<String>, skills: impl Into<String>, experience_level: ExperienceLevel) -> Self {
        Self {
            project_name: project_name.into(),
            skills: skills.into(),
            experience_level,
            reference_url: None,
            reference_document: None,
        }
    }

    /// Set the reference URL; blank strings mean no URL
    pub fn with_reference_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into().trim().to_string();
        self.reference_url = if url.is_empty() { None } else { Some(url) };
        self
    }

    /// Attach a reference document
    pub fn with_reference_document(mut self, document: ReferenceDocument) -> Self {
        self.reference_document = Some(document);
        self
    }

    /// Both the project name and the skills must be non-blank
    pub fn validate(&self) -> Result<(), WizardError> {
        debug!(
            project_name = %self.project_name,
            skills_len = self.skills.len(),
            "ProjectInput::validate: called"
        );
        if self.project_name.trim().is_empty() || self.skills.trim().is_empty() {
            return Err(WizardError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        Ok(())
    }
}
