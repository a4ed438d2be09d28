//! Project Forge - guided LLM project wizard
//!
//! CLI entry point: launches the TUI or runs a one-shot subcommand.

use std::fs;
use std::path::Path;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use projectforge::cli::{Cli, Command, generate_after_help, get_log_path};
use projectforge::config::Config;
use projectforge::export::{self, ExportFormat};
use projectforge::tui::{self, FormState};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with after_help showing configuration status
    let cmd = Cli::command().after_help(generate_after_help(None));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model(), "Project Forge loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Check) => cmd_check(&config),
        Some(Command::Export {
            ref file,
            ref name,
            format,
            ref out,
        }) => cmd_export(&config, file, name, format, out.as_deref()),
        None => {
            let form = prefilled_form(&cli);
            tui::run(&config, form).await
        }
    }
}

/// Form contents from the prefill flags
fn prefilled_form(cli: &Cli) -> FormState {
    FormState {
        name: cli.name.clone().unwrap_or_default(),
        skills: cli.skills.clone().unwrap_or_default(),
        level: cli.level.unwrap_or_default(),
        url: cli.url.clone().unwrap_or_default(),
        document: cli.doc.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
        ..FormState::default()
    }
}

fn cmd_check(config: &Config) -> Result<()> {
    debug!("cmd_check: called");
    println!("{} {}", "Provider:".bold(), config.llm.provider);
    println!("{} {}", "Model:".bold(), config.llm.model());
    println!("{} {}", "Export dir:".bold(), config.export.dir.display());

    match config.validate() {
        Ok(()) => {
            println!("{} API key found in configuration", "✓".green());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e.to_string().red());
            println!();
            println!("{}", "Configuration Required".yellow().bold());
            for (i, step) in config.llm.setup_instructions().iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
            Err(eyre::eyre!("Configuration incomplete: {}", e))
        }
    }
}

fn cmd_export(config: &Config, file: &Path, name: &str, format: ExportFormat, out: Option<&Path>) -> Result<()> {
    debug!(?file, %name, %format, ?out, "cmd_export: called");
    let proposal =
        fs::read_to_string(file).with_context(|| format!("Failed to read proposal {}", file.display()))?;
    let dir = out.unwrap_or(config.export.dir.as_path());
    let path = export::write(dir, format, name, &proposal).context("Failed to export proposal")?;
    println!("{} {}", "Saved".green(), path.display());
    Ok(())
}
