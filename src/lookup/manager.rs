use crate::api::MediaKind;
use crate::lookup::{
    LookupError, Result,
    cache::LookupCache,
    traits::{LookupInfo, MetadataLookup},
};
use std::sync::Arc;
use tracing::debug;

/// Fans a query out across the configured lookup providers, with a TTL
/// cache in front of each.
pub struct LookupManager {
    lookups: Vec<Arc<dyn MetadataLookup>>,
    cache: LookupCache,
}

impl LookupManager {
    pub fn new() -> Self {
        Self {
            lookups: Vec::new(),
            cache: LookupCache::new(),
        }
    }

    pub fn add_lookup<L: MetadataLookup + 'static>(&mut self, lookup: L) {
        self.lookups.push(Arc::new(lookup));
    }

    pub fn lookups(&self) -> &[Arc<dyn MetadataLookup>] {
        &self.lookups
    }

    /// Search every provider, concatenating whatever succeeds.
    pub async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
        let mut all_results = Vec::new();

        for lookup in &self.lookups {
            if let Some(cached) = self.cache.get(lookup.id(), query).await {
                debug!("lookup cache hit: {}:{query}", lookup.id());
                all_results.extend(cached);
                continue;
            }

            match lookup.search(query).await {
                Ok(results) => {
                    debug!("{} returned {} results", lookup.id(), results.len());
                    self.cache.set(lookup.id(), query, results.clone()).await;
                    all_results.extend(results);
                }
                Err(e) => {
                    debug!("{} search failed: {e}", lookup.id());
                }
            }
        }

        if all_results.is_empty() {
            return Err(LookupError::NotFound(format!(
                "No results found for: {query}"
            )));
        }

        Ok(all_results)
    }

    /// Resolve an exact external identifier against the first provider
    /// that recognizes it.
    pub async fn by_external_id(&self, id: &str) -> Result<Option<LookupInfo>> {
        for lookup in &self.lookups {
            if let Ok(Some(info)) = lookup.by_external_id(id).await {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    /// Ask the providers whether a keyword is a movie or a series.
    /// `None` when nobody is confident.
    pub async fn suggest_media_kind(&self, query: &str) -> Option<MediaKind> {
        for lookup in &self.lookups {
            match lookup.suggest_media_kind(query).await {
                Ok(Some(kind)) => return Some(kind),
                Ok(None) => {}
                Err(e) => debug!("{} suggestion failed: {e}", lookup.id()),
            }
        }
        None
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for LookupManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticLookup {
        kind: Option<MediaKind>,
    }

    #[async_trait]
    impl MetadataLookup for StaticLookup {
        fn id(&self) -> &'static str {
            "static"
        }

        fn name(&self) -> &'static str {
            "Static"
        }

        async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
            Ok(vec![
                LookupInfo::new("1", query, "static").with_kind(self.kind),
            ])
        }

        async fn suggest_media_kind(&self, _query: &str) -> Result<Option<MediaKind>> {
            Ok(self.kind)
        }
    }

    #[test]
    fn manager_starts_empty() {
        let manager = LookupManager::new();
        assert!(manager.lookups().is_empty());
    }

    #[tokio::test]
    async fn search_aggregates_and_caches() {
        let mut manager = LookupManager::new();
        manager.add_lookup(StaticLookup { kind: None });

        let first = manager.search("frieren").await.unwrap();
        assert_eq!(first.len(), 1);

        // Second call is served from cache; still one result
        let second = manager.search("frieren").await.unwrap();
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn suggestion_takes_the_first_confident_provider() {
        let mut manager = LookupManager::new();
        manager.add_lookup(StaticLookup { kind: None });
        manager.add_lookup(StaticLookup {
            kind: Some(MediaKind::Movie),
        });

        assert_eq!(
            manager.suggest_media_kind("inception").await,
            Some(MediaKind::Movie)
        );
    }
}
