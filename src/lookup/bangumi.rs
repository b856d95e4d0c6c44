use crate::api::MediaKind;
use crate::lookup::{
    Result,
    http::HttpClient,
    traits::{LookupInfo, MetadataLookup},
};
use async_trait::async_trait;
use serde::Deserialize;

const BANGUMI_API_URL: &str = "https://api.bgm.tv";

const SUBJECT_TYPE_ANIME: i32 = 2;
const SUBJECT_TYPE_MOVIE: i32 = 6;

/// Bangumi (bgm.tv) lookup. Strongest source for CJK anime titles.
pub struct BangumiLookup {
    client: HttpClient,
}

impl BangumiLookup {
    pub fn new(access_token: Option<&str>) -> Self {
        let mut client = HttpClient::new(BANGUMI_API_URL);
        if let Some(token) = access_token {
            client = client.with_bearer(token);
        }
        Self { client }
    }

    fn subject_to_info(subject: &Subject) -> LookupInfo {
        let title = subject
            .name_cn
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| subject.name.clone());

        let year = subject
            .date
            .as_deref()
            .or(subject.air_date.as_deref())
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok());

        let kind = match subject.subject_type {
            SUBJECT_TYPE_MOVIE => Some(MediaKind::Movie),
            SUBJECT_TYPE_ANIME => Some(MediaKind::TvSeries),
            _ => None,
        };

        LookupInfo::new(subject.id.to_string(), title, "bangumi")
            .with_kind(kind)
            .with_year(year)
            .with_popularity(subject.rating.as_ref().and_then(|r| r.score))
    }
}

#[async_trait]
impl MetadataLookup for BangumiLookup {
    fn id(&self) -> &'static str {
        "bangumi"
    }

    fn name(&self) -> &'static str {
        "Bangumi"
    }

    async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
        let encoded_query = urlencoding::encode(query);
        let endpoint =
            format!("/search/subject/{encoded_query}?type=2&responseGroup=small&max_results=20");

        let response: SearchResponse = self.client.get(&endpoint).await?;
        let subjects = response.list.unwrap_or_default();

        Ok(subjects.iter().map(Self::subject_to_info).collect())
    }

    /// Numeric subject ids resolve directly through the v0 API.
    async fn by_external_id(&self, id: &str) -> Result<Option<LookupInfo>> {
        if id.parse::<i64>().is_err() {
            return Ok(None);
        }
        let endpoint = format!("/v0/subjects/{id}");
        let subject: Subject = self.client.get(&endpoint).await?;
        Ok(Some(Self::subject_to_info(&subject)))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    list: Option<Vec<Subject>>,
}

#[derive(Debug, Deserialize)]
struct Subject {
    id: i32,
    #[serde(rename = "type")]
    subject_type: i32,
    name: String,
    name_cn: Option<String>,
    date: Option<String>,
    air_date: Option<String>,
    rating: Option<Rating>,
}

#[derive(Debug, Deserialize)]
struct Rating {
    score: Option<f64>,
}
