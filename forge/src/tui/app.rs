//! TUI application - key handling
//!
//! The App owns the TUI state and the wizard. Keys either edit local state
//! or become an `Intent` that the runner hands to the wizard; it does not do
//! any rendering or network I/O itself.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use super::state::{AppState, FormField, Screen};
use crate::export::{self, ExportFormat};
use crate::llm::LlmError;
use crate::wizard::{Intent, PendingCall, Step, Ticket, Wizard, WizardError};

/// TUI application
pub struct App {
    state: AppState,
    wizard: Wizard,
    export_dir: PathBuf,
}

impl App {
    pub fn new(state: AppState, wizard: Wizard, export_dir: PathBuf) -> Self {
        Self {
            state,
            wizard,
            export_dir,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    /// Hand an intent to the wizard, returning the call to run next if any
    pub fn apply(&mut self, intent: Intent) -> Result<Option<PendingCall>, WizardError> {
        let result = self.wizard.apply(intent);
        self.settle(&result);
        result
    }

    /// Feed a finished call back to the wizard
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<String, LlmError>,
    ) -> Result<Option<PendingCall>, WizardError> {
        let result = self.wizard.resolve(ticket, outcome);
        self.settle(&result);
        result
    }

    /// Drop the sent answer or change request once the wizard has committed it.
    /// After a failure the text stays so Enter retries it.
    fn settle(&mut self, result: &Result<Option<PendingCall>, WizardError>) {
        let session = self.wizard.state();
        if result.is_ok() && !session.loading() && session.last_error().is_none() {
            debug!("App::settle: clearing sent input");
            self.state.input.clear();
            self.state.editing_refinement = false;
        }
    }

    /// Handle a key event, returning the intent to dispatch if any
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Intent> {
        debug!(?key.code, step = %self.wizard.state().step(), "App::handle_key: called");
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.state.should_quit = true;
            return None;
        }
        if key.code == KeyCode::Char('n') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.start_over();
        }

        if matches!(self.state.screen, Screen::Setup { .. }) {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) {
                self.state.should_quit = true;
            }
            return None;
        }

        if self.scroll(key.code) {
            return None;
        }

        if self.wizard.state().loading() {
            debug!("App::handle_key: ignored while loading");
            return None;
        }

        match self.wizard.state().step() {
            Step::Initial => self.handle_form_key(key),
            Step::Clarifying => self.handle_answer_key(key),
            Step::Suggesting if self.state.editing_refinement => self.handle_refine_key(key),
            Step::Suggesting => self.handle_suggestion_key(key),
            Step::Refining => None,
            Step::Final => self.handle_final_key(key),
        }
    }

    /// Scroll keys: the conversation scrolls back from the bottom, the final
    /// proposal scrolls down from the top
    fn scroll(&mut self, code: KeyCode) -> bool {
        let step = self.wizard.state().step();
        if step == Step::Initial {
            return false;
        }
        let delta: i32 = match code {
            KeyCode::PageUp => -10,
            KeyCode::PageDown => 10,
            KeyCode::Up if step == Step::Final => -1,
            KeyCode::Down if step == Step::Final => 1,
            _ => return false,
        };
        let apply = |value: u16, delta: i32| -> u16 {
            let next = (i32::from(value) + delta).clamp(0, i32::from(u16::MAX));
            u16::try_from(next).unwrap_or(value)
        };
        if step == Step::Final {
            self.state.doc_scroll = apply(self.state.doc_scroll, delta);
        } else {
            self.state.scroll_back = apply(self.state.scroll_back, -delta);
        }
        true
    }

    fn start_over(&mut self) -> Option<Intent> {
        info!("Start over requested");
        self.state.reset_inputs();
        Some(Intent::StartOver)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Intent> {
        let form = &mut self.state.form;
        match key.code {
            KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Left if form.focus == FormField::Level => form.level = form.level.prev(),
            KeyCode::Right | KeyCode::Char(' ') if form.focus == FormField::Level => form.level = form.level.next(),
            KeyCode::Backspace => {
                if let Some(text) = form.focused_text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.focused_text_mut() {
                    text.push(c);
                }
            }
            KeyCode::Enter => {
                self.state.notice = None;
                return match self.state.form.to_input() {
                    Ok(input) => Some(Intent::Submit(input)),
                    Err(e) => {
                        warn!(error = %e, "App::handle_form_key: form rejected");
                        self.state.set_notice(e.to_string());
                        None
                    }
                };
            }
            _ => {}
        }
        None
    }

    /// Edit the shared input buffer; Enter yields the trimmed text
    ///
    /// The buffer is kept until the wizard commits the action (see `settle`).
    fn edit_input(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Char(c) => self.state.input.push(c),
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Enter => {
                let text = self.state.input.trim().to_string();
                if !text.is_empty() {
                    self.state.scroll_back = 0;
                    return Some(text);
                }
            }
            _ => {}
        }
        None
    }

    fn handle_answer_key(&mut self, key: KeyEvent) -> Option<Intent> {
        if key.code == KeyCode::Esc {
            self.state.input.clear();
            return None;
        }
        self.edit_input(key).map(Intent::Answer)
    }

    fn handle_refine_key(&mut self, key: KeyEvent) -> Option<Intent> {
        if key.code == KeyCode::Esc {
            self.state.input.clear();
            self.state.editing_refinement = false;
            return None;
        }
        self.edit_input(key).map(Intent::Refine)
    }

    fn handle_suggestion_key(&mut self, key: KeyEvent) -> Option<Intent> {
        match key.code {
            KeyCode::Char('a') | KeyCode::Enter => {
                self.state.scroll_back = 0;
                Some(Intent::Approve)
            }
            KeyCode::Char('r') => {
                self.state.editing_refinement = true;
                None
            }
            KeyCode::Char('s') => self.start_over(),
            KeyCode::Char('q') => {
                self.state.should_quit = true;
                None
            }
            _ => None,
        }
    }

    fn handle_final_key(&mut self, key: KeyEvent) -> Option<Intent> {
        match key.code {
            KeyCode::Char('t') => self.export(ExportFormat::Txt),
            KeyCode::Char('j') => self.export(ExportFormat::Json),
            KeyCode::Char('h') => self.export(ExportFormat::Html),
            KeyCode::Char('s') => return self.start_over(),
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            _ => {}
        }
        None
    }

    /// Write the final proposal in `format` to the export directory
    pub fn export(&mut self, format: ExportFormat) {
        debug!(%format, "App::export: called");
        let (Some(document), Some(input)) = (self.wizard.state().final_document(), self.wizard.input()) else {
            self.state.set_notice("Nothing to export yet");
            return;
        };
        match export::write(&self.export_dir, format, &input.project_name, document) {
            Ok(path) => self.state.set_notice(format!("Saved {}", path.display())),
            Err(e) => {
                warn!(error = %e, "App::export: failed");
                self.state.set_notice(e.to_string());
            }
        }
    }
}
