//! Project wizard
//!
//! The conversation core: form input, session state, the prompt policy for
//! each step, and the controller that sequences model calls.

mod controller;
mod error;
mod input;
mod policy;
mod state;

pub use controller::{CallKind, Intent, PendingCall, REFINEMENT_STATUS, SUGGESTION_STATUS, Ticket, Wizard};
pub use error::WizardError;
pub use input::{ExperienceLevel, ProjectInput, REQUIRED_FIELDS_MESSAGE, ReferenceDocument};
pub use policy::{
    CLARIFICATION_SENTINEL, MAX_CLARIFICATION_ROUNDS, PROPOSAL_SECTIONS, REQUIRED_SUGGESTION_SECTIONS, is_sentinel,
    missing_sections,
};
pub use state::{ChatMessage, ChatRole, SessionState, Step, transcript};
