//! Startup configuration
//!
//! Read once from the environment (after loading `.env`), with a TOML
//! secrets file as the fallback source for the API credential.

use crate::conversation::ContextPolicy;
use crate::llm::DEFAULT_BASE_URL;
use crate::state_machine::GenerationSettings;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
const DEFAULT_SECRETS_FILE: &str = "secrets.toml";
const DEFAULT_CONTEXT_TURNS: usize = 50;
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GROQ_API_KEY is missing. Set it in the environment, .env, or {0}")]
    MissingApiKey(String),
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Failed to read secrets file {path}: {message}")]
    Secrets { path: String, message: String },
}

/// Fully resolved application configuration
#[derive(Debug)]
pub struct AppConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub settings: GenerationSettings,
    pub context_policy: ContextPolicy,
    pub port: u16,
    pub session_idle: Duration,
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    #[serde(rename = "GROQ_API_KEY")]
    groq_api_key: Option<String>,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let secrets_path = get("MINDFUL_ECHO_SECRETS")
            .map_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE), PathBuf::from);
        let api_key = match get(API_KEY_VAR) {
            Some(key) => key,
            None => read_secrets_file(&secrets_path)?.ok_or_else(|| {
                ConfigError::MissingApiKey(secrets_path.display().to_string())
            })?,
        };

        let temperature = parse_var(&get, "MINDFUL_ECHO_TEMPERATURE")?.unwrap_or(0.7_f32);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                var: "MINDFUL_ECHO_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }

        let context_policy = match parse_var::<usize>(&get, "MINDFUL_ECHO_CONTEXT_TOKENS")? {
            Some(budget) => ContextPolicy::TokenBudget(budget),
            None => match parse_var::<usize>(&get, "MINDFUL_ECHO_CONTEXT_TURNS")?
                .unwrap_or(DEFAULT_CONTEXT_TURNS)
            {
                0 => ContextPolicy::Unbounded,
                n => ContextPolicy::LastTurns(n),
            },
        };

        let idle_minutes: u64 = parse_var(&get, "MINDFUL_ECHO_SESSION_IDLE_MINUTES")?
            .unwrap_or(DEFAULT_SESSION_IDLE_MINUTES);
        let session_idle = idle_minutes
            .checked_mul(60)
            .filter(|_| idle_minutes > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::Invalid {
                var: "MINDFUL_ECHO_SESSION_IDLE_MINUTES",
                value: idle_minutes.to_string(),
                reason: "must be a positive number of minutes".to_string(),
            })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            model: get("MINDFUL_ECHO_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("MINDFUL_ECHO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            settings: GenerationSettings {
                temperature,
                max_tokens: parse_var(&get, "MINDFUL_ECHO_MAX_TOKENS")?,
            },
            context_policy,
            port: parse_var(&get, "MINDFUL_ECHO_PORT")?.unwrap_or(8000),
            session_idle,
        })
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get(var)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// A missing file is not an error; an unreadable or malformed one is
fn read_secrets_file(path: &Path) -> Result<Option<String>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::Secrets {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    let secrets: SecretsFile = toml::from_str(&contents).map_err(|e| ConfigError::Secrets {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(secrets.groq_api_key.filter(|key| !key.trim().is_empty()))
}
