//! Project Forge configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Values that ship in sample configs and are never a real key
pub const PLACEHOLDER_KEYS: [&str; 3] = [
    "YOUR_API_KEY_HERE",
    "PASTE_YOUR_GEMINI_API_KEY_HERE",
    "PASTE_YOUR_API_KEY_HERE",
];

/// Errors that block the wizard from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LLM API key not found. Set the {env} environment variable.")]
    MissingApiKey { env: String },

    #[error("LLM API key from {origin} is still the placeholder value")]
    PlaceholderApiKey { origin: String },

    #[error("Failed to read API key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when --log-level is not given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Conversation controller tuning
    pub wizard: WizardConfig,

    /// Export destination
    pub export: ExportConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// The API key is the only mandatory external dependency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        debug!("Config::validate: called");
        self.llm.get_api_key().map(|_| ())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => Some(p.clone()),
            None => Self::search_paths().into_iter().find(|p| p.exists()),
        }?;
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Project-local config first, then the user config directory
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".projectforge.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("projectforge").join("projectforge.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("gemini" or "anthropic")
    pub provider: String,

    /// Model identifier (provider default when unset)
    pub model: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// File holding the API key, read when the environment variable is unset
    #[serde(rename = "api-key-file")]
    pub api_key_file: Option<PathBuf>,

    /// API base URL (provider default when unset)
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key_file: None,
            base_url: None,
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Model to request, falling back to the provider's default
    pub fn model(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "anthropic" => "claude-sonnet-4-20250514".to_string(),
            _ => "gemini-2.5-flash".to_string(),
        }
    }

    /// Base URL, falling back to the provider's public endpoint
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            "anthropic" => "https://api.anthropic.com".to_string(),
            _ => "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    /// Read the API key from the environment or the key file
    pub fn get_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key(|name| std::env::var(name).ok())
    }

    /// Resolve the API key with an injectable environment lookup
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!(api_key_env = %self.api_key_env, has_file = self.api_key_file.is_some(), "resolve_api_key: called");
        let (key, origin) = match lookup(&self.api_key_env) {
            Some(value) if !value.trim().is_empty() => (value, format!("${}", self.api_key_env)),
            _ => match &self.api_key_file {
                Some(path) => {
                    let value = fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
                        path: path.clone(),
                        source,
                    })?;
                    (value, path.display().to_string())
                }
                None => {
                    debug!("resolve_api_key: no key in environment and no key file");
                    return Err(ConfigError::MissingApiKey {
                        env: self.api_key_env.clone(),
                    });
                }
            },
        };

        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey {
                env: self.api_key_env.clone(),
            });
        }
        if PLACEHOLDER_KEYS.contains(&key.as_str()) {
            debug!(%origin, "resolve_api_key: placeholder key rejected");
            return Err(ConfigError::PlaceholderApiKey { origin });
        }
        Ok(key)
    }

    /// Human-readable steps for supplying the key
    pub fn setup_instructions(&self) -> Vec<String> {
        let key_url = match self.provider.as_str() {
            "anthropic" => "https://console.anthropic.com/settings/keys",
            _ => "https://aistudio.google.com/app/apikey",
        };
        vec![
            format!("Project Forge needs an API key for the {} provider.", self.provider),
            format!("Export it before launching:  export {}=<your key>", self.api_key_env),
            "Or point llm.api-key-file at a file containing the key in .projectforge.yml".to_string(),
            format!("Get a key at {}", key_url),
        ]
    }
}

/// Conversation controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Follow-up clarification rounds before a suggestion is forced (max 2)
    #[serde(rename = "max-clarification-rounds")]
    pub max_clarification_rounds: u8,

    /// Reject suggestions missing a required section
    #[serde(rename = "require-sections")]
    pub require_sections: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            max_clarification_rounds: 2,
            require_sections: true,
        }
    }
}

/// Export destination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported proposals are written to
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}
