use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform response envelope returned by every danmaku API endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Result of `GET /search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Opaque token required by every follow-up call
    #[serde(rename = "searchId", default)]
    pub search_id: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One entry of a search result list
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub provider: String,
    pub year: Option<i32>,
    pub season: Option<i32>,
    #[serde(rename = "episodeCount", default)]
    pub episode_count: u32,
}

/// One episode as returned by `GET /episodes` and consumed by
/// `POST /import/edited`.
///
/// The wire format allows missing fields; [`Episode::is_complete`] decides
/// whether an entry may be cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    #[serde(default)]
    pub provider: String,
    #[serde(rename = "episodeId", default)]
    pub episode_id: String,
    #[serde(default)]
    pub title: String,
    /// User-facing episode number, not necessarily contiguous
    #[serde(rename = "episodeIndex", default)]
    pub episode_index: u32,
}

impl Episode {
    /// An episode is only usable when all four fields carry data.
    pub fn is_complete(&self) -> bool {
        !self.provider.is_empty()
            && !self.episode_id.is_empty()
            && !self.title.is_empty()
            && self.episode_index > 0
    }
}

/// Acknowledgement of a submitted import
#[derive(Debug, Clone, Deserialize)]
pub struct ImportReceipt {
    #[serde(rename = "taskId")]
    pub task_id: Option<String>,
}

/// Identifier namespace for `POST /import/auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Keyword,
    Tmdb,
    Tvdb,
    Imdb,
    Douban,
    Bangumi,
}

/// Coarse media classification used by auto import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv_series")]
    TvSeries,
}

/// Body of `POST /import/auto`
#[derive(Debug, Clone, Serialize)]
pub struct AutoImportRequest {
    #[serde(rename = "searchType")]
    pub search_type: SearchType,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    #[serde(rename = "importMethod", skip_serializing_if = "Option::is_none")]
    pub import_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl AutoImportRequest {
    pub fn new(search_type: SearchType, search_term: impl Into<String>) -> Self {
        Self {
            search_type,
            search_term: search_term.into(),
            media_type: None,
            import_method: None,
            season: None,
            episode: None,
        }
    }

    pub fn with_media_type(mut self, kind: MediaKind) -> Self {
        self.media_type = Some(kind);
        self
    }

    pub fn with_episode(mut self, season: u32, episode: u32) -> Self {
        self.season = Some(season);
        self.episode = Some(episode);
        self
    }
}

/// One entry of `GET /library`
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    #[serde(rename = "animeId", default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub year: Option<i32>,
    pub season: Option<i32>,
    #[serde(rename = "episodeCount")]
    pub episode_count: Option<u32>,
}

/// One entry of `GET /library/anime/{id}/sources`
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    #[serde(rename = "sourceId", default)]
    pub id: i64,
    #[serde(rename = "providerName", default)]
    pub provider: String,
    #[serde(rename = "episodeCount")]
    pub episode_count: Option<u32>,
}

/// One entry of `GET /tasks`
#[derive(Debug, Clone, Deserialize)]
pub struct TaskInfo {
    #[serde(rename = "taskId", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    pub progress: Option<u32>,
    pub description: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}
