//! Configuration management for arxiv-trend.
//!
//! Configuration is read from environment variables:
//! - `ANTHROPIC_API_KEY` - Required. Credential for the Claude Messages API.
//! - `ANTHROPIC_MODEL` - Optional. Defaults to `claude-sonnet-4-5-20250929`.
//! - `ANTHROPIC_BASE_URL` - Optional. Defaults to `https://api.anthropic.com`.
//! - `ANTHROPIC_BETA` - Optional. Beta flags sent with every request.
//! - `MAX_TOKENS` - Optional. Output token bound per request. Defaults to `10000`.
//! - `MAX_TURNS` - Optional. Conversation turn bound. Defaults to `50`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Per-request timeout. Defaults to `300`.
//! - `ARXIV_BASE_URL` - Optional. arXiv query endpoint.
//! - `ARXIV_PAUSE_MS` - Optional. Pause after every arXiv call. Defaults to `1000`.
//! - `OUTPUT_PATH` - Optional. Report destination. Defaults to `output.md`.
//! - `LOG_FILE` - Optional. Diagnostic log file. Defaults to `arxiv_analyzer.log`.
//! - `SHOW_PROGRESS` - Optional. Console progress indicator. Defaults to `true`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_BETA: &str = "advanced-tool-use-2025-11-20";
pub const DEFAULT_ARXIV_BASE_URL: &str = "https://export.arxiv.org/api/query";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Diagnostic log settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// File that receives a copy of every log line
    pub log_file: PathBuf,

    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("arxiv_analyzer.log"),
            default_filter: "arxiv_trend=info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read logging settings on their own, for when the full configuration
    /// cannot be loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }
        config
    }
}

/// arXiv adapter settings.
#[derive(Debug, Clone)]
pub struct ArxivConfig {
    /// Atom query endpoint
    pub base_url: String,

    /// Fixed pause after every search call
    pub pause: Duration,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ARXIV_BASE_URL.to_string(),
            pause: Duration::from_millis(1000),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Anthropic API key
    pub api_key: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Messages API base URL (no trailing slash)
    pub api_base_url: String,

    /// Comma-separated `anthropic-beta` flags
    pub beta: Option<String>,

    /// Output token bound per request
    pub max_tokens: u32,

    /// Upper bound on conversation turns
    pub max_turns: usize,

    /// Fixed timeout for one AI service call
    pub request_timeout: Duration,

    /// Whether the console progress indicator runs
    pub show_progress: bool,

    /// Report destination
    pub output_path: PathBuf,

    pub arxiv: ArxivConfig,

    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `ANTHROPIC_API_KEY` is not set,
    /// `ConfigError::InvalidValue` if an optional variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Load configuration from any variable source; `from_env` uses the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?;

        let model = lookup("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base_url = lookup("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        // An explicitly empty value disables the beta header.
        let beta = match lookup("ANTHROPIC_BETA") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v),
            None => Some(DEFAULT_ANTHROPIC_BETA.to_string()),
        };

        let max_tokens = parse_var(&lookup, "MAX_TOKENS", 10_000u32)?;

        let max_turns = parse_var(&lookup, "MAX_TURNS", 50usize)?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_TURNS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let request_timeout = Duration::from_secs(parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 300u64)?);

        let show_progress = lookup("SHOW_PROGRESS")
            .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue("SHOW_PROGRESS".to_string(), e)))
            .transpose()?
            .unwrap_or(true);

        let output_path = lookup("OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("output.md"));

        let arxiv = ArxivConfig {
            base_url: lookup("ARXIV_BASE_URL").unwrap_or_else(|| DEFAULT_ARXIV_BASE_URL.to_string()),
            pause: Duration::from_millis(parse_var(&lookup, "ARXIV_PAUSE_MS", 1000u64)?),
        };

        Ok(Self {
            api_key,
            model,
            api_base_url,
            beta,
            max_tokens,
            max_turns,
            request_timeout,
            show_progress,
            output_path,
            arxiv,
            logging: LoggingConfig::from_lookup(&lookup),
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            beta: Some(DEFAULT_ANTHROPIC_BETA.to_string()),
            max_tokens: 10_000,
            max_turns: 50,
            request_timeout: Duration::from_secs(300),
            show_progress: false,
            output_path: PathBuf::from("output.md"),
            arxiv: ArxivConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}
