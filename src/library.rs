use crate::api::{self, DanmakuClient, LibraryEntry, SourceEntry};
use crate::bot::Reply;
use async_trait::async_trait;
use moka::future::Cache;
use parking_lot::RwLock;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tracing::warn;

/// Backend the library cache pulls snapshots from.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    async fn library(&self) -> api::Result<Vec<LibraryEntry>>;
    async fn sources(&self, media_id: i64) -> api::Result<Vec<SourceEntry>>;
}

#[async_trait]
impl LibrarySource for DanmakuClient {
    async fn library(&self) -> api::Result<Vec<LibraryEntry>> {
        DanmakuClient::library(self).await
    }

    async fn sources(&self, media_id: i64) -> api::Result<Vec<SourceEntry>> {
        DanmakuClient::sources(self, media_id).await
    }
}

/// TTL-cached view of the remote library.
///
/// The library listing is read-mostly and slow to produce remotely, so
/// readers share one snapshot until it expires. While a refresh is in
/// flight, other readers keep getting the previous snapshot instead of
/// piling onto the remote call.
pub struct LibraryCache {
    source: Arc<dyn LibrarySource>,
    cache: Cache<(), Arc<Vec<LibraryEntry>>>,
    last_good: RwLock<Option<Arc<Vec<LibraryEntry>>>>,
    refreshing: AtomicBool,
}

impl LibraryCache {
    pub fn new(source: Arc<dyn LibrarySource>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            source,
            cache,
            last_good: RwLock::new(None),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Current library snapshot, refreshed when the TTL has lapsed.
    pub async fn entries(&self) -> api::Result<Arc<Vec<LibraryEntry>>> {
        if let Some(snapshot) = self.cache.get(&()).await {
            return Ok(snapshot);
        }

        // Someone else is already refreshing; serve what we have
        if self.refreshing.swap(true, Ordering::AcqRel)
            && let Some(stale) = self.last_good.read().clone()
        {
            return Ok(stale);
        }

        let result = self.source.library().await;
        self.refreshing.store(false, Ordering::Release);

        match result {
            Ok(entries) => {
                let snapshot = Arc::new(entries);
                self.cache.insert((), snapshot.clone()).await;
                *self.last_good.write() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                if let Some(stale) = self.last_good.read().clone() {
                    warn!("library refresh failed, serving previous snapshot: {e}");
                    Ok(stale)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Sources are per-entry and cheap; always fetched live.
    pub async fn sources(&self, media_id: i64) -> api::Result<Vec<SourceEntry>> {
        self.source.sources(media_id).await
    }

    pub fn invalidate(&self) {
        self.cache.invalidate_all();
        *self.last_good.write() = None;
    }
}

/// Render a library snapshot as a chat reply.
pub fn render_library(entries: &[LibraryEntry]) -> Reply {
    if entries.is_empty() {
        return Reply::text("📭 The library is empty.");
    }

    let mut text = format!("📚 Library ({} entries):\n", entries.len());
    for entry in entries {
        text.push_str(&format!("\n• {}", entry.title));
        if let Some(year) = entry.year {
            text.push_str(&format!(" ({year})"));
        }
        if let Some(season) = entry.season {
            text.push_str(&format!(" [season {season}]"));
        }
        if let Some(count) = entry.episode_count {
            text.push_str(&format!(" {count} episodes"));
        }
    }

    Reply::text(text)
}
