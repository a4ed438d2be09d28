//! Terminal User Interface for Project Forge
//!
//! One screen per wizard step:
//! - Form for the project description
//! - Chat log with clarifying questions and the suggestion
//! - Final proposal with export keys
//!
//! A setup screen replaces all of these when no usable API key is configured.

mod app;
mod events;
mod runner;
pub mod state;
mod views;

pub use app::App;
pub use events::{Event, EventHandler};
pub use runner::TuiRunner;
pub use state::{AppState, FormField, FormState, Screen};

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm::{LlmClient, create_client};
use crate::prompts::PromptLoader;
use crate::wizard::Wizard;

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Build the app and client for a configuration
///
/// A missing or unusable API key yields the setup screen and no client.
pub fn build_app(config: &Config, form: FormState) -> (App, Option<Arc<dyn LlmClient>>) {
    let worktree = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let wizard = Wizard::new(PromptLoader::new(&worktree), config.wizard.clone());

    let client = config
        .llm
        .get_api_key()
        .map_err(|e| e.to_string())
        .and_then(|key| create_client(&config.llm, key).map_err(|e| e.to_string()));

    match client {
        Ok(client) => {
            info!(model = %client.model(), "LLM client ready");
            let mut state = AppState::new(client.model());
            state.form = form;
            (App::new(state, wizard, config.export.dir.clone()), Some(client))
        }
        Err(problem) => {
            warn!(%problem, "Configuration incomplete, showing setup screen");
            let state = AppState::setup(problem, config.llm.setup_instructions());
            (App::new(state, wizard, config.export.dir.clone()), None)
        }
    }
}

/// Run the wizard until the user quits
pub async fn run(config: &Config, form: FormState) -> Result<()> {
    let (app, client) = build_app(config, form);
    let terminal = init()?;

    // Restore the terminal even on early return/error
    struct TerminalGuard;
    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            let _ = restore();
        }
    }
    let _guard = TerminalGuard;

    let mut runner = TuiRunner::new(terminal, app, client);
    runner.run().await
}
