mod bangumi;
mod cache;
mod douban;
mod http;
mod imdb;
mod manager;
mod tmdb;
mod traits;
mod tvdb;

pub use bangumi::BangumiLookup;
pub use cache::{LookupCache, LookupCacheConfig};
pub use douban::DoubanLookup;
pub use http::HttpClient;
pub use imdb::ImdbLookup;
pub use manager::LookupManager;
pub use tmdb::TmdbLookup;
pub use traits::{LookupInfo, MetadataLookup};
pub use tvdb::TvdbLookup;

use crate::config::AppConfig;
use std::sync::Arc;

/// Lookup result type
pub type Result<T> = std::result::Result<T, LookupError>;

/// Errors from auxiliary metadata providers
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Build a lookup manager with every provider the configuration enables.
///
/// Bangumi and Douban need no credentials and are always on; TMDB and
/// TVDB join when their API keys are configured.
pub fn create_default_manager(config: &AppConfig) -> LookupManager {
    let mut manager = LookupManager::new();

    if let Some(key) = config.tmdb.api_key.as_deref() {
        manager.add_lookup(TmdbLookup::new(
            key,
            &config.tmdb.base_url,
            &config.tmdb.language,
        ));
    }
    if let Some(key) = config.tvdb.api_key.as_deref() {
        manager.add_lookup(TvdbLookup::new(key, &config.tvdb.base_url));
    }

    manager.add_lookup(ImdbLookup::new());
    manager.add_lookup(BangumiLookup::new(config.bangumi.access_token.as_deref()));
    manager.add_lookup(DoubanLookup::new());

    manager
}
