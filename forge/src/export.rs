//! Proposal export
//!
//! Turns the final Markdown proposal into a downloadable file: the raw text,
//! a small JSON envelope, or a standalone HTML page.

use std::path::{Path, PathBuf};

use pulldown_cmark_escape::escape_html;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::markdown;

/// Fixed stylesheet embedded in HTML exports
const HTML_STYLE: &str = "\
body { font-family: sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 2rem auto; padding: 0 1rem; }
h1, h2, h3 { color: #000; }
pre { background-color: #f4f4f4; padding: 1rem; border-radius: 5px; white-space: pre-wrap; word-wrap: break-word; }
code { font-family: monospace; }
blockquote { border-left: 4px solid #ddd; padding-left: 1rem; color: #666; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }";

/// Errors while producing or writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize proposal: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render proposal: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Txt,
    Json,
    Html,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProposalEnvelope<'a> {
    project_name: &'a str,
    proposal_markdown: &'a str,
}

/// Lowercase and replace everything outside `[a-z0-9]` with `_`
pub fn sanitize_file_stem(project_name: &str) -> String {
    project_name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' }
        })
        .collect()
}

/// `<sanitized name>_proposal.<ext>`
pub fn file_name(project_name: &str, format: ExportFormat) -> String {
    format!("{}_proposal.{}", sanitize_file_stem(project_name), format.extension())
}

/// Produce the export content for a format
pub fn render(format: ExportFormat, project_name: &str, proposal: &str) -> Result<String, ExportError> {
    debug!(%format, %project_name, len = proposal.len(), "render: called");
    match format {
        ExportFormat::Txt => Ok(proposal.to_string()),
        ExportFormat::Json => {
            let envelope = ProposalEnvelope {
                project_name,
                proposal_markdown: proposal,
            };
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
        ExportFormat::Html => render_html(project_name, proposal),
    }
}

fn render_html(project_name: &str, proposal: &str) -> Result<String, ExportError> {
    let mut title = String::with_capacity(project_name.len());
    escape_html(&mut title, project_name)?;
    Ok(format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title} - Project Proposal</title>\n\
         <style>\n{style}\n</style>\n\
         </head>\n\
         <body>\n{body}</body>\n\
         </html>\n",
        style = HTML_STYLE,
        body = markdown::to_html(proposal),
    ))
}

/// Render and write an export into `dir`, returning the written path
pub fn write(dir: &Path, format: ExportFormat, project_name: &str, proposal: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(file_name(project_name, format));
    let content = render(format, project_name, proposal)?;
    std::fs::write(&path, content).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!("Exported proposal to {}", path.display());
    Ok(path)
}
