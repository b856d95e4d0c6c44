use crate::api::MediaKind;
use crate::lookup::{
    Result,
    http::HttpClient,
    traits::{LookupInfo, MetadataLookup},
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// TMDB multi-search lookup.
///
/// Besides plain search it can suggest whether a keyword is a movie or a
/// series, which the auto-import flow uses to skip asking the user.
pub struct TmdbLookup {
    client: HttpClient,
    api_key: String,
    language: String,
}

impl TmdbLookup {
    pub fn new(api_key: impl Into<String>, base_url: &str, language: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new(base_url),
            api_key: api_key.into(),
            language: language.into(),
        }
    }

    async fn search_multi(&self, query: &str) -> Result<Vec<MultiResult>> {
        let response: MultiResponse = self
            .client
            .get_with_params(
                "/search/multi",
                &[
                    ("api_key", self.api_key.as_str()),
                    ("query", query),
                    ("language", self.language.as_str()),
                    ("page", "1"),
                ],
            )
            .await?;

        // People also show up in multi search; keep only movies and shows
        Ok(response
            .results
            .into_iter()
            .filter(|r| matches!(r.media_type.as_str(), "movie" | "tv"))
            .collect())
    }

    fn to_info(result: &MultiResult) -> LookupInfo {
        let title = result
            .title
            .clone()
            .or_else(|| result.name.clone())
            .unwrap_or_default();

        let kind = match result.media_type.as_str() {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::TvSeries),
            _ => None,
        };

        let year = result
            .release_date
            .as_deref()
            .or(result.first_air_date.as_deref())
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok());

        LookupInfo::new(result.id.to_string(), title, "tmdb")
            .with_kind(kind)
            .with_year(year)
            .with_popularity(result.popularity)
    }
}

#[async_trait]
impl MetadataLookup for TmdbLookup {
    fn id(&self) -> &'static str {
        "tmdb"
    }

    fn name(&self) -> &'static str {
        "TMDB"
    }

    async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
        let results = self.search_multi(query).await?;
        Ok(results.iter().map(Self::to_info).collect())
    }

    /// Suggest movie/series when one type clearly dominates the results.
    async fn suggest_media_kind(&self, query: &str) -> Result<Option<MediaKind>> {
        let results = self.search_multi(query).await?;
        if results.is_empty() {
            return Ok(None);
        }

        let movies = results.iter().filter(|r| r.media_type == "movie").count();
        let shows = results.len() - movies;

        let kind = match (movies, shows) {
            (0, _) => Some(MediaKind::TvSeries),
            (_, 0) => Some(MediaKind::Movie),
            // Mixed results: no confident call, the user picks
            _ => None,
        };

        if kind.is_some() {
            let best = results
                .iter()
                .max_by(|a, b| {
                    a.popularity
                        .unwrap_or(0.0)
                        .total_cmp(&b.popularity.unwrap_or(0.0))
                })
                .map(Self::to_info);
            if let Some(best) = best {
                debug!("TMDB suggestion for {query:?}: {kind:?} (best match {})", best.title);
            }
        }

        Ok(kind)
    }
}

#[derive(Debug, Deserialize)]
struct MultiResponse {
    #[serde(default)]
    results: Vec<MultiResult>,
}

#[derive(Debug, Deserialize)]
struct MultiResult {
    id: i64,
    #[serde(default)]
    media_type: String,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    popularity: Option<f64>,
}
