use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoachError, Result};

/// Environment variable that overrides the port of `server.listen_addr`
pub const PORT_ENV: &str = "PORT";

/// Environment variable that overrides `upstream.api_url`
pub const API_URL_ENV: &str = "HABITAI_API_URL";

/// Older name for [`API_URL_ENV`], still honored when the new one is unset
pub const LEGACY_API_URL_ENV: &str = "GROG_API_URL";

/// Default credential variable for `upstream.api_key_env`
pub const API_KEY_ENV: &str = "HABITAI_API_KEY";

/// Older name for [`API_KEY_ENV`], consulted only when `api_key_env` is left
/// at its default
pub const LEGACY_API_KEY_ENV: &str = "GROG_API_KEY";

/// Main configuration structure for the coach proxy
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream model API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Retry schedule for upstream calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Conversation history limits
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoachError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| CoachError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load config from an explicit path, or the first default location that
    /// exists, or fall back to defaults. Environment overrides are applied last.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => match default_config_paths().into_iter().find(|p| p.exists()) {
                Some(path) => {
                    tracing::info!("Loading config from: {}", path.display());
                    Self::from_file(&path)?
                }
                None => {
                    tracing::info!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(
            std::env::var(PORT_ENV).ok().as_deref(),
            env_with_legacy(API_URL_ENV, LEGACY_API_URL_ENV).as_deref(),
        )?;
        Ok(config)
    }

    /// Apply `PORT` and `HABITAI_API_URL` style overrides
    pub fn apply_env_overrides(&mut self, port: Option<&str>, api_url: Option<&str>) -> Result<()> {
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| CoachError::Config(format!("Invalid {PORT_ENV} '{port}': {e}")))?;
            let host = self
                .server
                .listen_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| self.server.listen_addr.clone());
            self.server.listen_addr = format!("{host}:{port}");
        }

        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.upstream.api_url = url.trim().to_string();
        }

        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Value of `name`, else of its older alias `legacy`. Blank counts as unset.
fn env_with_legacy(name: &str, legacy: &str) -> Option<String> {
    non_blank(std::env::var(name).ok()).or_else(|| {
        let value = non_blank(std::env::var(legacy).ok());
        if value.is_some() {
            tracing::warn!("{legacy} is deprecated, set {name} instead");
        }
        value
    })
}

fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::home_dir().map(|h| h.join(".habitai").join("config.toml")),
        dirs::config_dir().map(|c| c.join("habitai").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Upstream model API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Chat completions endpoint URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Environment variable name for the bearer credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Hard wall-clock timeout per upstream attempt, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Response length cap for chat and missed-day analysis
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Response length cap for habit plan generation
    #[serde(default = "default_plan_max_tokens")]
    pub plan_max_tokens: u32,
}

impl UpstreamConfig {
    /// Read the credential from the configured environment variable,
    /// falling back to `GROG_API_KEY` when that variable is the default one
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env == API_KEY_ENV {
            env_with_legacy(API_KEY_ENV, LEGACY_API_KEY_ENV)
        } else {
            non_blank(std::env::var(&self.api_key_env).ok())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            plan_max_tokens: default_plan_max_tokens(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.x.ai/v1/chat/completions".to_string()
}

fn default_api_key_env() -> String {
    API_KEY_ENV.to_string()
}

fn default_model() -> String {
    "grok-2-latest".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_plan_max_tokens() -> u32 {
    200
}

/// Fixed backoff schedule for upstream retries
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Delay before each retry, in milliseconds. One retry per entry.
    #[serde(default = "default_delays_ms")]
    pub delays_ms: Vec<u64>,
}

impl RetryConfig {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays_ms.iter().copied().map(Duration::from_millis).collect()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: default_delays_ms(),
        }
    }
}

fn default_delays_ms() -> Vec<u64> {
    vec![1000, 2000, 4000]
}

/// Conversation history limits
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of messages kept per conversation
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Number of messages returned by history inspection when no limit is given
    #[serde(default = "default_recent_default")]
    pub recent_default: usize,
    /// Conversations kept in memory before the least recently used is evicted
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            recent_default: default_recent_default(),
            max_conversations: default_max_conversations(),
        }
    }
}

fn default_max_messages() -> usize {
    10
}

fn default_recent_default() -> usize {
    5
}

fn default_max_conversations() -> usize {
    1000
}
