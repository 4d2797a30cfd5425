//! `verdict.ron` loading and merging with command-line overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdict_core::PollPolicy;
use verdict_engine::{ClientSettings, FallbackPolicy};
use verdict_logging::parse_level;

use super::cli::Overrides;

pub const DEFAULT_CONFIG_FILE: &str = "verdict.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// On-disk settings. Every field is optional; absent ones keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub bearer_token: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub max_consecutive_failures: Option<u32>,
    pub fallback_enabled: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientSettings,
    pub poll: PollPolicy,
    pub fallback: FallbackPolicy,
    pub log_level: LevelFilter,
}

/// Reads the config file. An explicit path must exist; the default one may be absent.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(FileConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path,
        message: err.to_string(),
    })
}

impl FileConfig {
    /// Applies `overrides` on top of the file and fills in defaults.
    pub fn resolve(self, overrides: &Overrides) -> Result<Settings, ConfigError> {
        let defaults = ClientSettings::default();
        let client = ClientSettings {
            base_url: overrides
                .base_url
                .clone()
                .or(self.base_url)
                .unwrap_or(defaults.base_url),
            connect_timeout: self
                .connect_timeout_secs
                .map(seconds("connect_timeout_secs"))
                .transpose()?
                .unwrap_or(defaults.connect_timeout),
            request_timeout: self
                .request_timeout_secs
                .map(seconds("request_timeout_secs"))
                .transpose()?
                .unwrap_or(defaults.request_timeout),
            bearer_token: overrides.token.clone().or(self.bearer_token),
        };

        let default_poll = PollPolicy::default();
        let poll = PollPolicy {
            interval: overrides
                .poll_interval_secs
                .or(self.poll_interval_secs)
                .map(seconds("poll_interval_secs"))
                .transpose()?
                .unwrap_or(default_poll.interval),
            max_consecutive_failures: self
                .max_consecutive_failures
                .unwrap_or(default_poll.max_consecutive_failures),
        };

        let fallback = FallbackPolicy {
            enabled: !overrides.no_fallback && self.fallback_enabled.unwrap_or(true),
            ..FallbackPolicy::default()
        };

        let log_level = match overrides.log_level.as_deref().or(self.log_level.as_deref()) {
            Some(name) => parse_level(name)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown log level {name:?}")))?,
            None => LevelFilter::Info,
        };

        Ok(Settings {
            client,
            poll,
            fallback,
            log_level,
        })
    }
}

fn seconds(field: &'static str) -> impl Fn(u64) -> Result<Duration, ConfigError> {
    move |secs| {
        if secs == 0 {
            Err(ConfigError::Invalid(format!("{field} must be at least 1")))
        } else {
            Ok(Duration::from_secs(secs))
        }
    }
}
