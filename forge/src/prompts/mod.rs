//! Prompt Template System
//!
//! Loads and renders the `.pmt` templates used for each wizard request.
//!
//! Template loading chain:
//! 1. `.projectforge/prompts/{name}.pmt` (project override)
//! 2. `~/.config/projectforge/prompts/{name}.pmt` (user override)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader, Template};
