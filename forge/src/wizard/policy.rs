//! What to ask the model at each step and how to read its replies

use tracing::{debug, warn};

use super::error::WizardError;
use super::input::ProjectInput;
use super::state::{ChatMessage, transcript};
use crate::llm::{GenerateRequest, Part};
use crate::markdown;
use crate::prompts::{PromptContext, PromptLoader, Template};

/// Reply meaning "enough information, move on to the suggestion"
pub const CLARIFICATION_SENTINEL: &str = "CLARIFICATION_COMPLETE";

/// Upper bound for follow-up clarification rounds
pub const MAX_CLARIFICATION_ROUNDS: u8 = 2;

/// Sections every suggestion must contain
pub const REQUIRED_SUGGESTION_SECTIONS: [&str; 3] = ["Project Overview", "Key Features", "Tech Stack"];

/// Sections the final proposal is asked to contain
pub const PROPOSAL_SECTIONS: [&str; 8] = [
    "Executive Summary",
    "Project Goals and Objectives",
    "Scope of Work",
    "Target Audience",
    "Tech Stack & Architecture",
    "Project Timeline/Roadmap",
    "Potential Risks and Mitigation",
    "Success Metrics",
];

/// Exact match after trimming surrounding whitespace
pub fn is_sentinel(reply: &str) -> bool {
    reply.trim() == CLARIFICATION_SENTINEL
}

/// Required sections absent from `document`, in the given order
pub fn missing_sections(document: &str, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|title| !markdown::has_section(document, title))
        .map(|title| title.to_string())
        .collect()
}

/// Reject a suggestion that lacks any of the three required sections
pub fn check_suggestion(suggestion: &str) -> Result<(), WizardError> {
    let missing = missing_sections(suggestion, &REQUIRED_SUGGESTION_SECTIONS);
    if missing.is_empty() {
        Ok(())
    } else {
        warn!(?missing, "check_suggestion: suggestion is missing sections");
        Err(WizardError::MalformedSuggestion { missing })
    }
}

/// Log, but accept, a proposal that skipped some sections
pub fn check_proposal(proposal: &str) {
    let missing = missing_sections(proposal, &PROPOSAL_SECTIONS);
    if !missing.is_empty() {
        warn!(?missing, "check_proposal: proposal is missing sections");
    }
}

fn render(loader: &PromptLoader, template: Template, ctx: &PromptContext) -> Result<String, WizardError> {
    loader
        .render(template, ctx)
        .map_err(|e| WizardError::Prompt(e.to_string()))
}

/// Clarifying question request carrying the form and the conversation so far
pub fn clarify_request(
    loader: &PromptLoader,
    input: &ProjectInput,
    messages: &[ChatMessage],
) -> Result<GenerateRequest, WizardError> {
    debug!(message_count = messages.len(), "clarify_request: called");
    let ctx = PromptContext::from_input(input).with_conversation(transcript(messages));
    Ok(GenerateRequest::text(render(loader, Template::Clarify, &ctx)?))
}

/// Suggestion request
///
/// With a reference URL the model is told to read it through web search;
/// otherwise the form and transcript are used and a reference document, if
/// any, rides along as inline data.
pub fn suggest_request(
    loader: &PromptLoader,
    input: &ProjectInput,
    messages: &[ChatMessage],
) -> Result<GenerateRequest, WizardError> {
    debug!(
        has_url = input.reference_url.is_some(),
        has_document = input.reference_document.is_some(),
        "suggest_request: called"
    );
    let ctx = PromptContext::from_input(input).with_conversation(transcript(messages));

    if input.reference_url.is_some() {
        let prompt = render(loader, Template::SuggestFromUrl, &ctx)?;
        return Ok(GenerateRequest::text(prompt).with_search());
    }

    let mut request = GenerateRequest::text(render(loader, Template::Suggest, &ctx)?);
    if let Some(doc) = &input.reference_document {
        request
            .parts
            .push(Part::inline_data(doc.mime_type.clone(), doc.base64_content.clone()));
    }
    Ok(request)
}

/// Request for a complete replacement suggestion with the change applied
pub fn refine_request(
    loader: &PromptLoader,
    input: &ProjectInput,
    previous: &str,
    change_request: &str,
) -> Result<GenerateRequest, WizardError> {
    debug!(%change_request, "refine_request: called");
    let ctx = PromptContext::from_input(input)
        .with_previous_suggestion(previous)
        .with_change_request(change_request);
    Ok(GenerateRequest::text(render(loader, Template::Refine, &ctx)?))
}

/// Request expanding the approved suggestion into the final proposal
pub fn proposal_request(
    loader: &PromptLoader,
    input: &ProjectInput,
    approved: &str,
) -> Result<GenerateRequest, WizardError> {
    debug!(approved_len = approved.len(), "proposal_request: called");
    let ctx = PromptContext::from_input(input).with_previous_suggestion(approved);
    Ok(GenerateRequest::text(render(loader, Template::Proposal, &ctx)?))
}
