//! Conversation controller
//!
//! Owns the session state and walks it through
//! `Initial -> Clarifying -> Suggesting -> (Refining) -> Final`.
//!
//! The controller never performs I/O itself. `apply` turns a user intent into
//! at most one `PendingCall`; whoever runs the call hands the outcome back to
//! `resolve`, which may chain one more call (a sentinel reply leads straight
//! into the suggestion request). The TUI runs calls on a spawned task; tests
//! and the `run` helper drive them inline.
//!
//! Each user action is a transaction. The state before the action is kept
//! until the last call of the chain succeeds; any failure restores it, so the
//! step is unchanged and repeating the action retries.

use tracing::{debug, info, warn};

use super::error::WizardError;
use super::input::ProjectInput;
use super::policy::{self, MAX_CLARIFICATION_ROUNDS};
use super::state::{ChatMessage, SessionState, Step};
use crate::config::WizardConfig;
use crate::llm::{GenerateRequest, LlmClient, LlmError};
use crate::prompts::PromptLoader;

/// Status line shown while the suggestion is generated
pub const SUGGESTION_STATUS: &str = "I'm crafting a project suggestion...";

/// Status line shown while a change request is applied
pub const REFINEMENT_STATUS: &str = "I'm refining the suggestion...";

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Submit(ProjectInput),
    Answer(String),
    Refine(String),
    Approve,
    StartOver,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Answer(_) => "answer",
            Self::Refine(_) => "refine",
            Self::Approve => "approve",
            Self::StartOver => "start-over",
        }
    }
}

/// Which request a pending call is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    InitialClarification,
    FollowUpClarification,
    Suggestion,
    Refinement,
    Proposal,
}

impl CallKind {
    /// Summary shown when this request fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::InitialClarification => "Failed to start the clarification process. Please try again.",
            Self::FollowUpClarification => "Failed to get clarification. Please try again.",
            Self::Suggestion => "Failed to generate project suggestion.",
            Self::Refinement => "Failed to refine the suggestion.",
            Self::Proposal => "Failed to generate the final proposal.",
        }
    }
}

/// Identifies one in-flight call; results carrying a stale ticket are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: CallKind,
    epoch: u64,
}

/// A request the caller must send to the gateway
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub request: GenerateRequest,
}

/// State to restore when an action fails
#[derive(Debug, Clone)]
struct Snapshot {
    state: SessionState,
    input: Option<ProjectInput>,
}

/// The conversation controller
pub struct Wizard {
    state: SessionState,
    input: Option<ProjectInput>,
    loader: PromptLoader,
    config: WizardConfig,
    snapshot: Option<Snapshot>,
    in_flight: Option<Ticket>,
    epoch: u64,
}

impl Wizard {
    pub fn new(loader: PromptLoader, config: WizardConfig) -> Self {
        debug!(?config, "Wizard::new: called");
        Self {
            state: SessionState::default(),
            input: None,
            loader,
            config,
            snapshot: None,
            in_flight: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The submitted form, if any
    pub fn input(&self) -> Option<&ProjectInput> {
        self.input.as_ref()
    }

    /// Effective follow-up round limit
    pub fn max_rounds(&self) -> u8 {
        self.config.max_clarification_rounds.min(MAX_CLARIFICATION_ROUNDS)
    }

    /// Apply a user intent, returning the call to run next if any
    pub fn apply(&mut self, intent: Intent) -> Result<Option<PendingCall>, WizardError> {
        debug!(step = %self.state.step(), loading = self.state.loading(), intent = intent.name(), "Wizard::apply: called");
        let result = match intent {
            Intent::StartOver => {
                self.reset();
                return Ok(None);
            }
            _ if self.state.loading() => {
                debug!("Wizard::apply: rejected, request in flight");
                return Err(WizardError::Busy);
            }
            Intent::Submit(input) => self.begin_submit(input),
            Intent::Answer(text) => self.begin_answer(text),
            Intent::Refine(text) => self.begin_refine(text),
            Intent::Approve => self.begin_approve(),
        };
        result.map(Some).map_err(|e| self.fail(e))
    }

    /// Feed back the outcome of a pending call
    ///
    /// Stale tickets (from before a start-over, or not the call in flight)
    /// are ignored and return `Ok(None)`.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<String, LlmError>,
    ) -> Result<Option<PendingCall>, WizardError> {
        debug!(?ticket, ok = outcome.is_ok(), "Wizard::resolve: called");
        if self.in_flight != Some(ticket) {
            debug!(current = ?self.in_flight, "Wizard::resolve: stale result discarded");
            return Ok(None);
        }
        self.in_flight = None;

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(kind = ?ticket.kind, error = %e, "Wizard::resolve: generation failed");
                return Err(self.fail(WizardError::generation(ticket.kind.failure_message(), e)));
            }
        };

        let result = match ticket.kind {
            CallKind::InitialClarification | CallKind::FollowUpClarification => self.on_clarification(reply),
            CallKind::Suggestion | CallKind::Refinement => self.on_suggestion(reply).map(|_| None),
            CallKind::Proposal => {
                self.on_proposal(reply);
                Ok(None)
            }
        };
        result.map_err(|e| self.fail(e))
    }

    /// Apply an intent and drive every resulting call through `client`
    pub async fn run(&mut self, intent: Intent, client: &dyn LlmClient) -> Result<(), WizardError> {
        let mut pending = self.apply(intent)?;
        while let Some(call) = pending {
            debug!(kind = ?call.ticket.kind, model = %client.model(), "Wizard::run: sending request");
            let outcome = client.generate(call.request).await;
            pending = self.resolve(call.ticket, outcome)?;
        }
        Ok(())
    }

    /// Validate the form and ask the first clarifying question
    pub async fn submit(&mut self, input: ProjectInput, client: &dyn LlmClient) -> Result<(), WizardError> {
        self.run(Intent::Submit(input), client).await
    }

    /// Answer the current clarifying question
    pub async fn answer(&mut self, text: impl Into<String>, client: &dyn LlmClient) -> Result<(), WizardError> {
        self.run(Intent::Answer(text.into()), client).await
    }

    /// Ask for a changed suggestion
    pub async fn refine(&mut self, text: impl Into<String>, client: &dyn LlmClient) -> Result<(), WizardError> {
        self.run(Intent::Refine(text.into()), client).await
    }

    /// Accept the suggestion and generate the final proposal
    pub async fn approve(&mut self, client: &dyn LlmClient) -> Result<(), WizardError> {
        self.run(Intent::Approve, client).await
    }

    /// Drop everything and return to the empty form
    pub fn start_over(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        info!(step = %self.state.step(), "Starting over");
        self.epoch += 1;
        self.state = SessionState::default();
        self.input = None;
        self.snapshot = None;
        self.in_flight = None;
    }

    fn begin_submit(&mut self, input: ProjectInput) -> Result<PendingCall, WizardError> {
        self.require_step("submit", Step::Initial)?;
        input.validate()?;
        info!(project_name = %input.project_name, level = %input.experience_level, "Project submitted");

        self.begin_transaction();
        self.input = Some(input);
        self.state.set_step(Step::Clarifying);
        let request = policy::clarify_request(&self.loader, self.current_input()?, self.state.messages())?;
        Ok(self.issue(CallKind::InitialClarification, request))
    }

    fn begin_answer(&mut self, text: String) -> Result<PendingCall, WizardError> {
        self.require_step("answer", Step::Clarifying)?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(WizardError::Validation("Please type an answer.".to_string()));
        }

        self.begin_transaction();
        self.state.push_message(ChatMessage::user(text));
        if self.state.clarification_rounds() < self.max_rounds() {
            self.state.increment_rounds();
            debug!(rounds = self.state.clarification_rounds(), "Wizard::begin_answer: follow-up round");
            let request = policy::clarify_request(&self.loader, self.current_input()?, self.state.messages())?;
            Ok(self.issue(CallKind::FollowUpClarification, request))
        } else {
            info!(rounds = self.state.clarification_rounds(), "Clarification limit reached");
            self.begin_suggestion()
        }
    }

    fn begin_refine(&mut self, text: String) -> Result<PendingCall, WizardError> {
        self.require_step("refine", Step::Suggesting)?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(WizardError::Validation("Please describe the change you want.".to_string()));
        }
        let previous = self
            .state
            .suggestion_draft()
            .ok_or(WizardError::InvalidStep {
                action: "refine",
                step: self.state.step(),
            })?
            .to_string();

        self.begin_transaction();
        self.state.push_message(ChatMessage::user(format!("Change request: {}", text)));
        self.state.push_message(ChatMessage::status(REFINEMENT_STATUS));
        self.state.set_step(Step::Refining);
        let request = policy::refine_request(&self.loader, self.current_input()?, &previous, &text)?;
        Ok(self.issue(CallKind::Refinement, request))
    }

    fn begin_approve(&mut self) -> Result<PendingCall, WizardError> {
        self.require_step("approve", Step::Suggesting)?;
        let approved = self
            .state
            .suggestion_draft()
            .ok_or(WizardError::InvalidStep {
                action: "approve",
                step: self.state.step(),
            })?
            .to_string();

        self.begin_transaction();
        self.state.set_step(Step::Final);
        let request = policy::proposal_request(&self.loader, self.current_input()?, &approved)?;
        Ok(self.issue(CallKind::Proposal, request))
    }

    /// Move to Suggesting and build the suggestion request
    fn begin_suggestion(&mut self) -> Result<PendingCall, WizardError> {
        self.state.set_step(Step::Suggesting);
        self.state.push_message(ChatMessage::status(SUGGESTION_STATUS));
        let request = policy::suggest_request(&self.loader, self.current_input()?, self.state.messages())?;
        Ok(self.issue(CallKind::Suggestion, request))
    }

    fn on_clarification(&mut self, reply: String) -> Result<Option<PendingCall>, WizardError> {
        if policy::is_sentinel(&reply) {
            info!(rounds = self.state.clarification_rounds(), "Model has enough information");
            return self.begin_suggestion().map(Some);
        }
        debug!(rounds = self.state.clarification_rounds(), "Wizard::on_clarification: question received");
        self.state.push_message(ChatMessage::assistant(reply.trim()));
        self.commit();
        Ok(None)
    }

    fn on_suggestion(&mut self, reply: String) -> Result<(), WizardError> {
        if self.config.require_sections {
            policy::check_suggestion(&reply)?;
        }
        info!(len = reply.len(), "Suggestion ready");
        self.state.set_suggestion_draft(reply.clone());
        self.state.push_message(ChatMessage::assistant(reply));
        self.state.set_step(Step::Suggesting);
        self.commit();
        Ok(())
    }

    fn on_proposal(&mut self, reply: String) {
        policy::check_proposal(&reply);
        info!(len = reply.len(), "Final proposal ready");
        self.state.set_final_document(reply);
        self.commit();
    }

    fn require_step(&self, action: &'static str, expected: Step) -> Result<(), WizardError> {
        if self.state.step() == expected {
            Ok(())
        } else {
            Err(WizardError::InvalidStep {
                action,
                step: self.state.step(),
            })
        }
    }

    fn current_input(&self) -> Result<&ProjectInput, WizardError> {
        self.input
            .as_ref()
            .ok_or_else(|| WizardError::Validation(super::input::REQUIRED_FIELDS_MESSAGE.to_string()))
    }

    fn begin_transaction(&mut self) {
        self.snapshot = Some(Snapshot {
            state: self.state.clone(),
            input: self.input.clone(),
        });
        self.state.clear_error();
    }

    fn issue(&mut self, kind: CallKind, request: GenerateRequest) -> PendingCall {
        let ticket = Ticket {
            kind,
            epoch: self.epoch,
        };
        self.state.set_loading(true);
        self.in_flight = Some(ticket);
        PendingCall { ticket, request }
    }

    fn commit(&mut self) {
        self.snapshot = None;
        self.state.set_loading(false);
    }

    /// Roll back the current action and record the error
    fn fail(&mut self, err: WizardError) -> WizardError {
        if let Some(snapshot) = self.snapshot.take() {
            debug!(step = %snapshot.state.step(), "Wizard::fail: rolling back");
            self.state = snapshot.state;
            self.input = snapshot.input;
        }
        self.in_flight = None;
        self.state.set_loading(false);
        self.state.set_error(err.user_message());
        err
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(PromptLoader::embedded_only(), WizardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::wizard::{ChatRole, ExperienceLevel, ReferenceDocument};
    use proptest::prelude::*;

    const SUGGESTION: &str = "# Recipe App\n\n## Project Overview\nA recipe finder.\n\n## Key Features\n- Search\n\n## Tech Stack\nReact, Firebase";
    const REFINED: &str = "# Recipe App\n\n## Project Overview\nA recipe finder with accounts.\n\n## Key Features\n- Search\n- Auth\n\n## Tech Stack\nReact, Firebase Auth";
    const PROPOSAL: &str = "# Recipe App\n\n## Executive Summary\nShort.\n\n## Success Metrics\n- 10 users";

    fn recipe_app() -> ProjectInput {
        ProjectInput::new("Recipe App", "React, Firebase", ExperienceLevel::Beginner)
    }

    async fn wizard_at_suggestion() -> Wizard {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE", SUGGESTION]);
        let mut wizard = Wizard::default();
        wizard.submit(recipe_app(), &client).await.unwrap();
        assert_eq!(wizard.state().step(), Step::Suggesting);
        wizard
    }

    #[tokio::test]
    async fn test_immediate_sentinel_goes_straight_to_suggestion() {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE", SUGGESTION]);
        let mut wizard = Wizard::default();

        wizard.submit(recipe_app(), &client).await.unwrap();

        let state = wizard.state();
        assert_eq!(state.step(), Step::Suggesting);
        assert_eq!(state.clarification_rounds(), 0);
        assert_eq!(state.suggestion_draft(), Some(SUGGESTION));
        assert_eq!(state.count_role(ChatRole::User), 0);
        assert_eq!(state.count_role(ChatRole::Assistant), 1);
        assert!(!state.loading());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_two_questions_then_sentinel() {
        let client = MockLlmClient::new(vec![
            "Which platform are you targeting?",
            "Do you need user accounts?",
            "CLARIFICATION_COMPLETE",
            SUGGESTION,
        ]);
        let mut wizard = Wizard::default();

        wizard.submit(recipe_app(), &client).await.unwrap();
        assert_eq!(wizard.state().step(), Step::Clarifying);
        assert_eq!(wizard.state().clarification_rounds(), 0);

        wizard.answer("Web", &client).await.unwrap();
        assert_eq!(wizard.state().clarification_rounds(), 1);

        wizard.answer("Yes", &client).await.unwrap();

        let state = wizard.state();
        assert_eq!(state.clarification_rounds(), 2);
        assert_eq!(state.count_role(ChatRole::Assistant), 3);
        assert_eq!(state.step(), Step::Suggesting);
        assert_eq!(state.messages()[0], ChatMessage::assistant("Which platform are you targeting?"));
    }

    #[tokio::test]
    async fn test_answer_at_cap_forces_suggestion_without_clarifying() {
        let client = MockLlmClient::new(vec!["Q1?", "Q2?", "Q3?", SUGGESTION]);
        let mut wizard = Wizard::default();

        wizard.submit(recipe_app(), &client).await.unwrap();
        wizard.answer("a1", &client).await.unwrap();
        wizard.answer("a2", &client).await.unwrap();
        assert_eq!(wizard.state().step(), Step::Clarifying);
        assert_eq!(wizard.state().clarification_rounds(), 2);

        wizard.answer("a3", &client).await.unwrap();

        assert_eq!(wizard.state().step(), Step::Suggesting);
        assert_eq!(wizard.state().clarification_rounds(), 2);
        assert_eq!(client.call_count(), 4);
        let last = &client.requests()[3];
        assert!(last.prompt_text().contains("Project Overview"));
        assert!(last.prompt_text().contains("User: a3"));
    }

    #[tokio::test]
    async fn test_sentinel_with_whitespace_matches() {
        let client = MockLlmClient::new(vec!["  CLARIFICATION_COMPLETE \n", SUGGESTION]);
        let mut wizard = Wizard::default();
        wizard.submit(recipe_app(), &client).await.unwrap();
        assert_eq!(wizard.state().step(), Step::Suggesting);
    }

    #[tokio::test]
    async fn test_sentinel_with_period_is_a_question() {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE."]);
        let mut wizard = Wizard::default();
        wizard.submit(recipe_app(), &client).await.unwrap();

        assert_eq!(wizard.state().step(), Step::Clarifying);
        assert_eq!(wizard.state().messages(), &[ChatMessage::assistant("CLARIFICATION_COMPLETE.")]);
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_fields() {
        let client = MockLlmClient::new(vec![]);
        let mut wizard = Wizard::default();

        let err = wizard
            .submit(ProjectInput::new("  ", "React", ExperienceLevel::Beginner), &client)
            .await
            .unwrap_err();

        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(wizard.state().step(), Step::Initial);
        assert_eq!(
            wizard.state().last_error(),
            Some("Project Name and Skills to Learn are required.")
        );
        assert!(wizard.input().is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_initial_failure_rolls_back_and_retry_works() {
        let client = MockLlmClient::scripted(vec![Err("unavailable".to_string()), Ok("Which platform?".to_string())]);
        let mut wizard = Wizard::default();

        let err = wizard.submit(recipe_app(), &client).await.unwrap_err();
        assert!(matches!(err, WizardError::Generation { .. }));
        assert_eq!(wizard.state().step(), Step::Initial);
        assert!(!wizard.state().loading());
        assert!(
            wizard
                .state()
                .last_error()
                .unwrap()
                .starts_with("Failed to start the clarification process. Please try again.")
        );
        assert!(wizard.input().is_none());

        wizard.submit(recipe_app(), &client).await.unwrap();
        assert_eq!(wizard.state().step(), Step::Clarifying);
        assert!(wizard.state().last_error().is_none());
    }

    #[tokio::test]
    async fn test_follow_up_failure_keeps_round_and_answer_unrecorded() {
        let client = MockLlmClient::scripted(vec![Ok("Q1?".to_string()), Err("timeout".to_string())]);
        let mut wizard = Wizard::default();
        wizard.submit(recipe_app(), &client).await.unwrap();
        let before = wizard.state().messages().to_vec();

        let err = wizard.answer("Web", &client).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to get clarification. Please try again.");
        assert_eq!(wizard.state().step(), Step::Clarifying);
        assert_eq!(wizard.state().clarification_rounds(), 0);
        assert_eq!(wizard.state().messages(), before.as_slice());
    }

    #[tokio::test]
    async fn test_suggestion_failure_after_sentinel_returns_to_initial() {
        let client = MockLlmClient::scripted(vec![Ok("CLARIFICATION_COMPLETE".to_string()), Err("boom".to_string())]);
        let mut wizard = Wizard::default();

        let err = wizard.submit(recipe_app(), &client).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to generate project suggestion.");
        assert_eq!(wizard.state().step(), Step::Initial);
        assert!(wizard.state().messages().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_suggestion_is_rejected() {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE", "Just build a website."]);
        let mut wizard = Wizard::default();

        let err = wizard.submit(recipe_app(), &client).await.unwrap_err();

        assert!(matches!(err, WizardError::MalformedSuggestion { .. }));
        assert!(wizard.state().suggestion_draft().is_none());
        assert_eq!(wizard.state().step(), Step::Initial);
    }

    #[tokio::test]
    async fn test_sections_not_required_when_disabled() {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE", "Just build a website."]);
        let config = WizardConfig {
            require_sections: false,
            ..WizardConfig::default()
        };
        let mut wizard = Wizard::new(PromptLoader::embedded_only(), config);

        wizard.submit(recipe_app(), &client).await.unwrap();
        assert_eq!(wizard.state().suggestion_draft(), Some("Just build a website."));
    }

    #[tokio::test]
    async fn test_refine_replaces_draft() {
        let mut wizard = wizard_at_suggestion().await;
        let client = MockLlmClient::new(vec![REFINED]);

        wizard.refine("add user accounts", &client).await.unwrap();

        let state = wizard.state();
        assert_eq!(state.step(), Step::Suggesting);
        assert_eq!(state.suggestion_draft(), Some(REFINED));
        assert!(
            state
                .messages()
                .contains(&ChatMessage::user("Change request: add user accounts"))
        );
        assert!(state.messages().contains(&ChatMessage::status(REFINEMENT_STATUS)));
        let prompt = client.requests()[0].prompt_text();
        assert!(prompt.contains(SUGGESTION));
        assert!(prompt.contains("add user accounts"));
    }

    #[tokio::test]
    async fn test_refine_failure_keeps_previous_draft() {
        let mut wizard = wizard_at_suggestion().await;
        let client = MockLlmClient::scripted(vec![Err("boom".to_string())]);

        let err = wizard.refine("add auth", &client).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to refine the suggestion.");
        assert_eq!(wizard.state().step(), Step::Suggesting);
        assert_eq!(wizard.state().suggestion_draft(), Some(SUGGESTION));
    }

    #[tokio::test]
    async fn test_refining_step_while_in_flight() {
        let mut wizard = wizard_at_suggestion().await;
        let call = wizard.apply(Intent::Refine("dark mode".to_string())).unwrap().unwrap();

        assert_eq!(wizard.state().step(), Step::Refining);
        assert!(wizard.state().loading());
        assert!(matches!(wizard.apply(Intent::Approve), Err(WizardError::Busy)));

        wizard.resolve(call.ticket, Ok(REFINED.to_string())).unwrap();
        assert_eq!(wizard.state().step(), Step::Suggesting);
    }

    #[tokio::test]
    async fn test_approve_produces_final_document() {
        let mut wizard = wizard_at_suggestion().await;
        let client = MockLlmClient::new(vec![PROPOSAL]);

        wizard.approve(&client).await.unwrap();

        assert_eq!(wizard.state().step(), Step::Final);
        assert_eq!(wizard.state().final_document(), Some(PROPOSAL));
        assert!(client.requests()[0].prompt_text().contains(SUGGESTION));
    }

    #[tokio::test]
    async fn test_approve_failure_stays_in_suggesting() {
        let mut wizard = wizard_at_suggestion().await;
        let client = MockLlmClient::scripted(vec![Err("boom".to_string())]);

        let err = wizard.approve(&client).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to generate the final proposal.");
        assert_eq!(wizard.state().step(), Step::Suggesting);
        assert!(wizard.state().final_document().is_none());
    }

    #[tokio::test]
    async fn test_invalid_step_actions() {
        let mut wizard = Wizard::default();
        assert!(matches!(
            wizard.apply(Intent::Approve),
            Err(WizardError::InvalidStep { action: "approve", .. })
        ));
        assert!(matches!(
            wizard.apply(Intent::Answer("x".to_string())),
            Err(WizardError::InvalidStep { .. })
        ));
        assert_eq!(wizard.state().step(), Step::Initial);
    }

    #[tokio::test]
    async fn test_start_over_resets_everything() {
        let mut wizard = wizard_at_suggestion().await;
        let client = MockLlmClient::new(vec![PROPOSAL]);
        wizard.approve(&client).await.unwrap();

        wizard.start_over();

        assert_eq!(wizard.state(), &SessionState::default());
        assert!(wizard.input().is_none());
    }

    #[test]
    fn test_start_over_discards_in_flight_result() {
        let mut wizard = Wizard::default();
        let call = wizard.apply(Intent::Submit(recipe_app())).unwrap().unwrap();
        assert!(wizard.state().loading());

        wizard.apply(Intent::StartOver).unwrap();
        assert_eq!(wizard.state(), &SessionState::default());

        let next = wizard.resolve(call.ticket, Ok("Which platform?".to_string())).unwrap();
        assert!(next.is_none());
        assert_eq!(wizard.state(), &SessionState::default());
    }

    #[tokio::test]
    async fn test_reference_url_enables_search_for_suggestion_only() {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE", SUGGESTION]);
        let mut wizard = Wizard::default();
        let input = recipe_app().with_reference_url("https://react.dev/learn");

        wizard.submit(input, &client).await.unwrap();

        let requests = client.requests();
        assert!(!requests[0].enable_search);
        assert!(requests[1].enable_search);
        assert!(requests[1].prompt_text().contains("https://react.dev/learn"));
    }

    #[tokio::test]
    async fn test_reference_document_attached_to_suggestion() {
        let client = MockLlmClient::new(vec!["CLARIFICATION_COMPLETE", SUGGESTION]);
        let mut wizard = Wizard::default();
        let doc = ReferenceDocument::from_bytes("outline.pdf", "application/pdf", b"%PDF");
        wizard.submit(recipe_app().with_reference_document(doc), &client).await.unwrap();

        let requests = client.requests();
        assert!(!requests[0].has_attachment());
        assert!(requests[1].has_attachment());
    }

    #[test]
    fn test_zero_round_config_suggests_after_first_answer() {
        let config = WizardConfig {
            max_clarification_rounds: 0,
            ..WizardConfig::default()
        };
        let mut wizard = Wizard::new(PromptLoader::embedded_only(), config);
        let call = wizard.apply(Intent::Submit(recipe_app())).unwrap().unwrap();
        wizard.resolve(call.ticket, Ok("Web or mobile?".to_string())).unwrap();

        let call = wizard.apply(Intent::Answer("Web".to_string())).unwrap().unwrap();
        assert_eq!(call.ticket.kind, CallKind::Suggestion);
    }

    proptest! {
        #[test]
        fn prop_rounds_never_exceed_cap(replies in proptest::collection::vec(any::<bool>(), 1..8)) {
            let mut wizard = Wizard::default();
            let mut call = wizard.apply(Intent::Submit(recipe_app())).unwrap();
            let mut previous_rounds = 0;

            for is_done in replies {
                let Some(pending) = call.take() else { break };
                let reply = match pending.ticket.kind {
                    CallKind::Suggestion => SUGGESTION.to_string(),
                    _ if is_done => policy::CLARIFICATION_SENTINEL.to_string(),
                    _ => "Another question?".to_string(),
                };
                let next = wizard.resolve(pending.ticket, Ok(reply)).unwrap();

                let rounds = wizard.state().clarification_rounds();
                prop_assert!(rounds <= MAX_CLARIFICATION_ROUNDS);
                prop_assert!(rounds >= previous_rounds);
                previous_rounds = rounds;

                call = match next {
                    Some(next) => Some(next),
                    None if wizard.state().step() == Step::Clarifying => {
                        wizard.apply(Intent::Answer("answer".to_string())).unwrap()
                    }
                    None => None,
                };
            }
            if wizard.state().step() == Step::Suggesting && !wizard.state().loading() {
                prop_assert!(wizard.state().suggestion_draft().is_some());
            }
        }
    }
}
