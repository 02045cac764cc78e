//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

use feedline_core::{Backoff, FeedTags, HttpSinkConfig, Recovery};

/// Global configuration for feedline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub batch: BatchConfig,
    pub feed: FeedConfig,
    pub sink: SinkConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub threshold_bytes: usize,
    /// Pending batches for the sender thread; 0 sends inline
    pub queue: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: feedline_core::DEFAULT_THRESHOLD_BYTES,
            queue: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FeedConfig {
    #[serde(flatten)]
    pub tags: FeedTags,
    pub recovery: Recovery,
}

/// Where flushed batches go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Print a report per batch to stdout
    #[default]
    Report,
    /// Write one JSON file per batch
    Dir,
    /// POST each batch to an HTTP endpoint
    Http,
    /// Discard batches
    Null,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Report => write!(f, "report"),
            Self::Dir => write!(f, "dir"),
            Self::Http => write!(f, "http"),
            Self::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Output directory for the `dir` sink
    pub dir: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Report,
            dir: PathBuf::from("./batches"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub url: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: std::env::var("FEEDLINE_TOKEN").ok(),
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl HttpConfig {
    /// Sink settings for `url`
    pub fn sink_config(&self, url: &str) -> HttpSinkConfig {
        HttpSinkConfig {
            url: url.to_string(),
            token: self.token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            backoff: Backoff {
                max_retries: self.max_retries,
                ..Backoff::default()
            },
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    match s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(var_name) => std::env::var(var_name).ok(),
        None => Some(s.to_string()),
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./feedline.toml (current directory)
    /// 2. <user config dir>/feedline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("feedline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "feedline") {
            let user_config = dirs.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Extraction and batching settings for the core pipeline
    pub fn pipeline(&self) -> feedline_core::Config {
        feedline_core::Config {
            threshold_bytes: self.batch.threshold_bytes,
            tags: self.feed.tags.clone(),
            recovery: self.feed.recovery,
        }
    }
}
