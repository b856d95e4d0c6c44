use crate::api::MediaKind;
use crate::lookup::Result;
use async_trait::async_trait;

/// Summary record returned by every lookup provider.
#[derive(Debug, Clone)]
pub struct LookupInfo {
    /// Provider-specific ID
    pub id: String,
    /// Display title
    pub title: String,
    /// Coarse classification, when the provider knows it
    pub media_kind: Option<MediaKind>,
    /// Release year
    pub year: Option<i32>,
    /// Provider-specific ranking signal
    pub popularity: Option<f64>,
    /// Provider identifier (e.g. "tmdb")
    pub provider: &'static str,
}

impl LookupInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, provider: &'static str) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            media_kind: None,
            year: None,
            popularity: None,
            provider,
        }
    }

    pub fn with_kind(mut self, kind: Option<MediaKind>) -> Self {
        self.media_kind = kind;
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn with_popularity(mut self, popularity: Option<f64>) -> Self {
        self.popularity = popularity;
        self
    }
}

/// Core trait for auxiliary metadata lookups
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Provider identifier (e.g. "tmdb", "bangumi")
    fn id(&self) -> &'static str;

    /// Human-readable provider name
    fn name(&self) -> &'static str;

    /// Search for media by title
    async fn search(&self, query: &str) -> Result<Vec<LookupInfo>>;

    /// Look up by an exact external identifier (e.g. a tt-id)
    async fn by_external_id(&self, _id: &str) -> Result<Option<LookupInfo>> {
        Ok(None)
    }

    /// Suggest a media kind for a keyword, if this provider can tell
    async fn suggest_media_kind(&self, _query: &str) -> Result<Option<crate::api::MediaKind>> {
        Ok(None)
    }
}
