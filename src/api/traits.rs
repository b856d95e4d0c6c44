use crate::api::{
    Result,
    types::{AutoImportRequest, Episode, ImportReceipt, SearchResponse},
};
use async_trait::async_trait;

/// The remote capabilities the conversation core consumes.
///
/// [`DanmakuClient`](crate::api::DanmakuClient) is the production
/// implementation; tests substitute a stub.
#[async_trait]
pub trait DanmakuApi: Send + Sync {
    /// Search media by keyword, yielding a search id plus result list
    async fn search(&self, keyword: &str) -> Result<SearchResponse>;

    /// Fetch the full episode list of one search result
    async fn episodes(&self, search_id: &str, result_index: usize) -> Result<Vec<Episode>>;

    /// Import one whole result without enumerating episodes
    async fn import_direct(&self, search_id: &str, result_index: usize) -> Result<ImportReceipt>;

    /// Import an explicit subset of episodes
    async fn import_edited(
        &self,
        search_id: &str,
        result_index: usize,
        episodes: &[Episode],
    ) -> Result<ImportReceipt>;

    /// Import by external identifier (keyword / TMDB / TVDB / IMDB / ...)
    async fn import_auto(&self, request: &AutoImportRequest) -> Result<ImportReceipt>;
}
