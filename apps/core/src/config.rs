use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Log output selected by `TRIAGE_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Bunyan-style JSON lines.
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("unknown log format '{}'", other))),
        }
    }
}

/// Settings for the provider-backed responder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResponderConfig {
    /// Disabled means the template responder handles every reply.
    pub enabled: bool,
    /// Base URL of the completion server.
    #[validate(url)]
    pub url: String,
    /// Optional bearer token sent with each request.
    pub token: Option<String>,
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1, max = 4096))]
    pub max_tokens: u32,
    /// Health probes before the provider is given up on.
    #[validate(range(min = 1, max = 30))]
    pub health_retries: u32,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8080".to_string(),
            token: None,
            timeout_secs: 20,
            temperature: 0.7,
            max_tokens: 300,
            health_retries: 3,
        }
    }
}

impl ResponderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub database_url: String,
    #[validate(range(min = 1, max = 64))]
    pub db_max_connections: u32,
    #[validate(range(min = 1, max = 120))]
    pub storage_timeout_secs: u64,
    #[validate(nested)]
    pub responder: ResponderConfig,
    /// JSON lexicon replacing the built-in one.
    pub lexicon_path: Option<PathBuf>,
    pub log_format: LogFormat,
    /// User id the console transport talks as.
    #[validate(length(min = 1))]
    pub console_user: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://triage.sqlite?mode=rwc".to_string(),
            db_max_connections: 5,
            storage_timeout_secs: 5,
            responder: ResponderConfig::default(),
            lexicon_path: None,
            log_format: LogFormat::Pretty,
            console_user: "console".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `TRIAGE_*` variables over the defaults and validates the result.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let config = Self {
            database_url: env_or("TRIAGE_DATABASE_URL", defaults.database_url)?,
            db_max_connections: env_or("TRIAGE_DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            storage_timeout_secs: env_or(
                "TRIAGE_STORAGE_TIMEOUT_SECS",
                defaults.storage_timeout_secs,
            )?,
            responder: ResponderConfig {
                enabled: env_or("TRIAGE_AI_ENABLED", defaults.responder.enabled)?,
                url: env_or("TRIAGE_AI_URL", defaults.responder.url)?,
                token: env_opt("TRIAGE_AI_TOKEN"),
                timeout_secs: env_or("TRIAGE_AI_TIMEOUT_SECS", defaults.responder.timeout_secs)?,
                temperature: env_or("TRIAGE_AI_TEMPERATURE", defaults.responder.temperature)?,
                max_tokens: env_or("TRIAGE_AI_MAX_TOKENS", defaults.responder.max_tokens)?,
                health_retries: env_or(
                    "TRIAGE_AI_HEALTH_RETRIES",
                    defaults.responder.health_retries,
                )?,
            },
            lexicon_path: env_opt("TRIAGE_LEXICON_PATH").map(PathBuf::from),
            log_format: env_or("TRIAGE_LOG_FORMAT", defaults.log_format)?,
            console_user: env_or("TRIAGE_CONSOLE_USER", defaults.console_user)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", name, raw, e))),
        None => Ok(default),
    }
}
