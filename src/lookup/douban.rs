use crate::lookup::{
    Result,
    http::HttpClient,
    traits::{LookupInfo, MetadataLookup},
};
use async_trait::async_trait;
use serde::Deserialize;

const DOUBAN_BASE: &str = "https://www.douban.com";

/// Douban lookup via the public search-suggest endpoint. No key needed.
pub struct DoubanLookup {
    client: HttpClient,
}

impl DoubanLookup {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(DOUBAN_BASE),
        }
    }
}

impl Default for DoubanLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataLookup for DoubanLookup {
    fn id(&self) -> &'static str {
        "douban"
    }

    fn name(&self) -> &'static str {
        "Douban"
    }

    async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
        let suggestions: Vec<Suggestion> = self
            .client
            .get_with_params("/j/search_suggest", &[("q", query)])
            .await?;

        Ok(suggestions
            .iter()
            .filter(|s| s.kind.as_deref() == Some("movie"))
            .map(|s| {
                let year = s.year.as_deref().and_then(|y| y.parse().ok());
                // The suggest payload does not distinguish films from
                // series; both come back as "movie"
                LookupInfo::new(s.id.clone().unwrap_or_default(), s.title.clone(), "douban")
                    .with_year(year)
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: String,
    year: Option<String>,
    id: Option<String>,
}
