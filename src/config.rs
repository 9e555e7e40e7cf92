use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::completion::DEFAULT_MODEL;
use crate::prompt::TRANSCRIPT_CHAR_LIMIT;
use crate::summary::{DEFAULT_LANGUAGE, DEFAULT_MAX_RESULTS, SummarizerOptions};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bind: Option<String>,
    pub language: Option<String>,
    pub model: Option<String>,
    pub search_timeout_secs: Option<u64>,
    pub max_results: Option<u32>,
    pub transcript_char_limit: Option<usize>,
}

impl Config {
    /// Load config from ~/.config/fiorelo/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("fiorelo")
        .join("config.toml")
}

/// Values that override the config file: environment first, then CLI flags
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub language: Option<String>,
    pub model: Option<String>,
    pub search_timeout_secs: Option<u64>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub language: String,
    pub model: String,
    pub search_timeout: Duration,
    pub max_results: u32,
    pub transcript_char_limit: usize,
    pub youtube_api_key: Option<String>,
    pub groq_api_key: Option<String>,
}

impl Settings {
    pub fn resolve(config: Config, env: &Overrides, cli: &Overrides) -> Result<Self> {
        let bind = cli
            .bind
            .clone()
            .or_else(|| env.bind.clone())
            .or(config.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind.parse().wrap_err_with(|| format!("invalid bind address: {bind}"))?;

        Ok(Self {
            bind,
            language: cli
                .language
                .clone()
                .or_else(|| env.language.clone())
                .or(config.language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            model: cli
                .model
                .clone()
                .or_else(|| env.model.clone())
                .or(config.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            search_timeout: Duration::from_secs(
                cli.search_timeout_secs
                    .or(env.search_timeout_secs)
                    .or(config.search_timeout_secs)
                    .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            ),
            max_results: config.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            transcript_char_limit: config.transcript_char_limit.unwrap_or(TRANSCRIPT_CHAR_LIMIT),
            youtube_api_key: None,
            groq_api_key: None,
        })
    }

    /// Pick up credentials from the process environment
    pub fn with_env_keys(mut self) -> Self {
        self.youtube_api_key = env_var("YT_API_KEY");
        self.groq_api_key = env_var("GROQ_API_KEY");
        self
    }

    pub fn summarizer_options(&self) -> SummarizerOptions {
        SummarizerOptions {
            language: self.language.clone(),
            max_results: self.max_results,
            char_limit: self.transcript_char_limit,
        }
    }
}

pub fn env_overrides() -> Overrides {
    Overrides {
        bind: env_var("FIORELO_BIND"),
        ..Overrides::default()
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
