use crate::api::MediaKind;
use crate::lookup::{
    Result,
    http::HttpClient,
    traits::{LookupInfo, MetadataLookup},
};
use async_trait::async_trait;
use serde::Deserialize;

const SUGGESTION_BASE: &str = "https://v2.sg.media-imdb.com";

/// IMDB lookup backed by the public suggestion endpoint.
///
/// Needs no API key. Its main job is resolving tt-ids pasted by users
/// into a title before auto import.
pub struct ImdbLookup {
    client: HttpClient,
}

impl ImdbLookup {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(SUGGESTION_BASE),
        }
    }

    async fn suggest(&self, term: &str) -> Result<Vec<Suggestion>> {
        let normalized = term.trim().to_lowercase().replace(' ', "_");
        let first = normalized.chars().next().unwrap_or('a');
        let endpoint = format!(
            "/suggestion/{first}/{}.json",
            urlencoding::encode(&normalized)
        );

        let response: SuggestionResponse = self.client.get(&endpoint).await?;
        Ok(response.entries)
    }

    fn to_info(s: &Suggestion) -> Option<LookupInfo> {
        // Suggestions include people; titles all carry tt-ids
        if !s.id.starts_with("tt") {
            return None;
        }
        let kind = s.category.as_deref().map(|q| {
            if q.contains("TV") {
                MediaKind::TvSeries
            } else {
                MediaKind::Movie
            }
        });
        Some(
            LookupInfo::new(&s.id, s.title.clone().unwrap_or_default(), "imdb")
                .with_kind(kind)
                .with_year(s.year),
        )
    }
}

impl Default for ImdbLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataLookup for ImdbLookup {
    fn id(&self) -> &'static str {
        "imdb"
    }

    fn name(&self) -> &'static str {
        "IMDB"
    }

    async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
        let suggestions = self.suggest(query).await?;
        Ok(suggestions.iter().filter_map(Self::to_info).collect())
    }

    /// tt-ids can be fed straight into the suggestion endpoint.
    async fn by_external_id(&self, id: &str) -> Result<Option<LookupInfo>> {
        if !id.starts_with("tt") {
            return Ok(None);
        }
        let suggestions = self.suggest(id).await?;
        Ok(suggestions
            .iter()
            .find(|s| s.id == id)
            .and_then(Self::to_info))
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default, rename = "d")]
    entries: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    id: String,
    #[serde(rename = "l")]
    title: Option<String>,
    #[serde(rename = "y")]
    year: Option<i32>,
    #[serde(rename = "q")]
    category: Option<String>,
}
