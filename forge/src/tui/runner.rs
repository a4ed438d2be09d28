//! TUI Runner - main loop that owns the terminal and the in-flight request
//!
//! The TuiRunner is responsible for:
//! - Drawing a frame per event
//! - Dispatching intents from the App to the wizard
//! - Running gateway calls on a spawned task and feeding results back
//! - Aborting the running call when the user starts over or quits

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::views;
use crate::llm::{LlmClient, LlmError};
use crate::wizard::{Intent, PendingCall, Ticket};

/// Outcome of one gateway call
#[derive(Debug)]
struct CallResult {
    ticket: Ticket,
    outcome: Result<String, LlmError>,
}

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    /// `None` on the setup screen
    client: Option<Arc<dyn LlmClient>>,
    result_tx: mpsc::Sender<CallResult>,
    result_rx: mpsc::Receiver<CallResult>,
    /// Handle to the background gateway call
    task: Option<JoinHandle<()>>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, app: App, client: Option<Arc<dyn LlmClient>>) -> Self {
        debug!(has_client = client.is_some(), "TuiRunner::new: called");
        let (result_tx, result_rx) = mpsc::channel(1);
        Self {
            app,
            terminal,
            event_handler: EventHandler::new(Duration::from_millis(80)),
            client,
            result_tx,
            result_rx,
            task: None,
        }
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        info!("TUI started");
        loop {
            self.terminal.draw(|frame| views::render(&self.app, frame))?;

            match self.event_handler.next().await? {
                Event::Tick => {
                    self.app.state_mut().tick();
                }
                Event::Key(key) => {
                    if let Some(intent) = self.app.handle_key(key) {
                        self.dispatch(intent);
                    }
                }
                Event::Resize(width, height) => {
                    debug!(%width, %height, "Terminal resized");
                }
            }

            self.process_results();

            if self.app.state().should_quit {
                break;
            }
        }

        self.abort_task();
        info!("TUI stopped");
        Ok(())
    }

    /// Hand an intent to the wizard and start the resulting call
    fn dispatch(&mut self, intent: Intent) {
        debug!(intent = intent.name(), "TuiRunner::dispatch: called");
        if intent == Intent::StartOver {
            self.abort_task();
        }
        match self.app.apply(intent) {
            Ok(Some(call)) => self.spawn_call(call),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "TuiRunner::dispatch: rejected"),
        }
    }

    /// Feed finished calls back into the wizard (non-blocking)
    fn process_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            debug!(kind = ?result.ticket.kind, ok = result.outcome.is_ok(), "TuiRunner::process_results: received");
            match self.app.resolve(result.ticket, result.outcome) {
                Ok(Some(call)) => self.spawn_call(call),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Request failed"),
            }
        }
    }

    fn spawn_call(&mut self, call: PendingCall) {
        let Some(client) = self.client.as_ref().map(Arc::clone) else {
            warn!("TuiRunner::spawn_call: no client configured");
            let outcome = Err(LlmError::InvalidResponse("No LLM client configured".to_string()));
            if let Err(e) = self.app.resolve(call.ticket, outcome) {
                debug!(error = %e, "TuiRunner::spawn_call: call failed without client");
            }
            return;
        };
        info!(kind = ?call.ticket.kind, model = %client.model(), "Spawning gateway call");
        let tx = self.result_tx.clone();
        self.task = Some(tokio::spawn(async move {
            let outcome = client.generate(call.request).await;
            let _ = tx
                .send(CallResult {
                    ticket: call.ticket,
                    outcome,
                })
                .await;
        }));
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("TuiRunner::abort_task: aborting in-flight call");
            task.abort();
        }
    }
}
