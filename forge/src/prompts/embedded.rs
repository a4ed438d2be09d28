//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Clarifying question or completion sentinel
pub const CLARIFY: &str = include_str!("../../prompts/clarify.pmt");

/// Project suggestion from the form and conversation
pub const SUGGEST: &str = include_str!("../../prompts/suggest.pmt");

/// Project suggestion grounded on a reference URL via web search
pub const SUGGEST_FROM_URL: &str = include_str!("../../prompts/suggest-url.pmt");

/// Suggestion rewrite for a change request
pub const REFINE: &str = include_str!("../../prompts/refine.pmt");

/// Final eight-section proposal
pub const PROPOSAL: &str = include_str!("../../prompts/proposal.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "clarify" => Some(CLARIFY),
        "suggest" => Some(SUGGEST),
        "suggest-url" => Some(SUGGEST_FROM_URL),
        "refine" => Some(REFINE),
        "proposal" => Some(PROPOSAL),
        _ => None,
    };
    if found.is_none() {
        debug!("get_embedded: no match found");
    }
    found
}
