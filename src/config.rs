use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use launch_jenkins::jenkins::{PollSettings, TransportSettings};

const FILE_NAMES: [&str; 4] = [
    "launch-jenkins.toml",
    "launch-jenkins.json",
    "launch-jenkins.yaml",
    "launch-jenkins.yml",
];

/// Configuration file structure for launch-jenkins.
///
/// Holds credentials and tuning that would otherwise be repeated on every
/// invocation. Command-line arguments take precedence over these values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Jenkins username
    pub user: Option<String>,

    /// Jenkins API token
    pub token: Option<String>,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransportConfig {
    /// Extra attempts for GET requests that fail at the network level
    #[serde(default = "default_get_retries")]
    pub get_retries: u32,

    /// Pause between retries, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Overrides the User-Agent header
    pub user_agent: Option<String>,

    /// Fetch a CSRF crumb when connecting
    #[serde(default = "default_fetch_crumb")]
    pub fetch_crumb: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollingConfig {
    /// Seconds between two polls of the queue or the build
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Give up after this many polls
    pub max_polls: Option<u32>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            get_retries: default_get_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            fetch_crumb: default_fetch_crumb(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_polls: None,
        }
    }
}

fn default_get_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fetch_crumb() -> bool {
    true
}

fn default_interval_secs() -> f64 {
    5.0
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./launch-jenkins.toml, .json, .yaml, .yml
    /// 3. `<config dir>/launch-jenkins/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("launch-jenkins").join("config.toml"));
        let candidates = FILE_NAMES
            .iter()
            .map(PathBuf::from)
            .chain(user_config);

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        let defaults = TransportSettings::default();
        TransportSettings {
            get_retries: self.transport.get_retries,
            retry_delay: Duration::from_millis(self.transport.retry_delay_ms),
            timeout: Duration::from_secs(self.transport.timeout_secs),
            user_agent: self
                .transport
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            fetch_crumb: self.transport.fetch_crumb,
        }
    }

    /// Poll settings, with command-line overrides applied.
    pub fn poll_settings(
        &self,
        interval_secs: Option<f64>,
        max_polls: Option<u32>,
    ) -> Result<PollSettings> {
        let interval_secs = interval_secs.unwrap_or(self.polling.interval_secs);
        let interval = Duration::try_from_secs_f64(interval_secs)
            .ok()
            .filter(|interval| !interval.is_zero())
            .with_context(|| format!("Poll interval must be a positive number of seconds, got {interval_secs}"))?;

        Ok(PollSettings {
            interval,
            max_attempts: max_polls.or(self.polling.max_polls),
        })
    }
}
