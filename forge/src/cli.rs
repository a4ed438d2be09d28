//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::export::ExportFormat;
use crate::wizard::ExperienceLevel;

/// Project Forge - turn a learning goal into a project proposal
#[derive(Debug, Parser)]
#[command(
    name = "pf",
    about = "Guided LLM wizard that turns a learning goal into a project proposal",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Prefill the project name
    #[arg(long)]
    pub name: Option<String>,

    /// Prefill the skills to learn
    #[arg(long)]
    pub skills: Option<String>,

    /// Prefill the experience level
    #[arg(long, value_enum)]
    pub level: Option<ExperienceLevel>,

    /// Prefill the reference URL
    #[arg(long)]
    pub url: Option<String>,

    /// Prefill the reference document path
    #[arg(long)]
    pub doc: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check configuration and show setup instructions if needed
    Check,

    /// Export an existing Markdown proposal
    Export {
        /// Markdown file containing the proposal
        #[arg(value_name = "MARKDOWN")]
        file: PathBuf,

        /// Project name used for the title and file name
        #[arg(short, long)]
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "txt")]
        format: ExportFormat,

        /// Output directory (defaults to export.dir from config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("projectforge")
        .join("logs")
        .join("projectforge.log")
}

/// Generate the after_help text with configuration status
pub fn generate_after_help(config_path: Option<&PathBuf>) -> String {
    debug!(?config_path, "generate_after_help: called");
    let mut help = String::new();

    help.push_str("Configuration:\n");
    match Config::load(config_path) {
        Ok(config) => {
            let icon = if config.validate().is_ok() { "\u{2705}" } else { "\u{274C}" };
            help.push_str(&format!(
                "  {} {} ({}, key from ${})\n",
                icon,
                config.llm.provider,
                config.llm.model(),
                config.llm.api_key_env
            ));
        }
        Err(e) => {
            help.push_str(&format!("  \u{274C} {}\n", e));
        }
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_prefill_flags() {
        let cli = Cli::try_parse_from(["pf", "--name", "Recipe App", "--skills", "React", "--level", "advanced"]).unwrap();
        assert_eq!(cli.name.as_deref(), Some("Recipe App"));
        assert_eq!(cli.level, Some(ExperienceLevel::Advanced));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from(["pf", "export", "proposal.md", "--name", "Recipe App", "--format", "html"]).unwrap();
        match cli.command {
            Some(Command::Export { file, name, format, out }) => {
                assert_eq!(file, PathBuf::from("proposal.md"));
                assert_eq!(name, "Recipe App");
                assert_eq!(format, ExportFormat::Html);
                assert!(out.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("projectforge/logs/projectforge.log"));
    }
}
