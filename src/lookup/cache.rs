use crate::lookup::traits::LookupInfo;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Cache key for search results
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct SearchKey {
    provider: &'static str,
    query: String,
}

/// TTL cache for lookup search results
#[derive(Clone)]
pub struct LookupCache {
    search_cache: Cache<SearchKey, Arc<Vec<LookupInfo>>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::with_config(LookupCacheConfig::default())
    }

    pub fn with_config(config: LookupCacheConfig) -> Self {
        let search_cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { search_cache }
    }

    pub async fn get(&self, provider: &'static str, query: &str) -> Option<Vec<LookupInfo>> {
        let key = SearchKey {
            provider,
            query: query.to_lowercase(),
        };
        self.search_cache.get(&key).await.map(|arc| (*arc).clone())
    }

    pub async fn set(&self, provider: &'static str, query: &str, results: Vec<LookupInfo>) {
        let key = SearchKey {
            provider,
            query: query.to_lowercase(),
        };
        self.search_cache.insert(key, Arc::new(results)).await;
    }

    pub fn clear(&self) {
        self.search_cache.invalidate_all();
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct LookupCacheConfig {
    pub max_entries: u64,
    pub ttl: Duration,
}

impl Default for LookupCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            ttl: Duration::from_secs(3600),
        }
    }
}
