use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Configuration load/validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level application configuration
///
/// Values come from an optional `config.toml` with `DANMAKU_BOT_*`
/// environment variables layered on top.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Danmaku API connection settings
    pub api: DanmakuApiConfig,

    /// Conversation/bot behaviour
    #[serde(default)]
    pub bot: BotConfig,

    /// TMDB lookup settings
    #[serde(default)]
    pub tmdb: TmdbConfig,

    /// TVDB lookup settings
    #[serde(default)]
    pub tvdb: TvdbConfig,

    /// Bangumi lookup settings
    #[serde(default)]
    pub bangumi: BangumiConfig,
}

/// Remote danmaku API settings
#[derive(Debug, Deserialize, Clone)]
pub struct DanmakuApiConfig {
    /// Base URL of the danmaku service, e.g. `https://danmaku.example.com/api/v1`
    pub base_url: String,

    /// API key appended to every request
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

/// Bot behaviour settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotConfig {
    /// Users allowed to talk to the bot; empty means nobody
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,

    /// TTL of the cached library snapshot in seconds
    #[serde(default = "default_library_ttl")]
    pub library_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_language")]
    pub language: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
            language: default_tmdb_language(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TvdbConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_tvdb_base_url")]
    pub base_url: String,
}

impl Default for TvdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tvdb_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BangumiConfig {
    /// Optional bearer token for authenticated Bangumi requests
    pub access_token: Option<String>,
}

impl AppConfig {
    /// Load configuration from the given TOML file (if present) plus
    /// `DANMAKU_BOT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("DANMAKU_BOT").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must be set".into()));
        }
        if self.api.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api.api_key must be set".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_api_timeout() -> u64 {
    60
}

fn default_library_ttl() -> u64 {
    300
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_language() -> String {
    "zh-CN".to_string()
}

fn default_tvdb_base_url() -> String {
    "https://api4.thetvdb.com/v4".to_string()
}
