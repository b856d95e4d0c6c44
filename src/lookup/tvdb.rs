use crate::api::MediaKind;
use crate::lookup::{
    LookupError, Result,
    http::HttpClient,
    traits::{LookupInfo, MetadataLookup},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

/// TVDB v4 lookup.
///
/// The v4 API wants a bearer token obtained from `/login`; the token is
/// fetched lazily on first use and refreshed after a 401.
pub struct TvdbLookup {
    client: HttpClient,
    api_key: String,
    authed: RwLock<Option<HttpClient>>,
}

impl TvdbLookup {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            client: HttpClient::new(base_url),
            api_key: api_key.into(),
            authed: RwLock::new(None),
        }
    }

    async fn authed_client(&self) -> Result<HttpClient> {
        if let Some(client) = self.authed.read().await.as_ref() {
            return Ok(client.clone());
        }

        let response: LoginResponse = self
            .client
            .post_json("/login", &json!({ "apikey": self.api_key }))
            .await?;
        let token = response
            .data
            .map(|d| d.token)
            .ok_or_else(|| LookupError::Parse("TVDB login returned no token".to_string()))?;

        let client = self.client.clone().with_bearer(token);
        *self.authed.write().await = Some(client.clone());
        Ok(client)
    }

    async fn drop_token(&self) {
        *self.authed.write().await = None;
    }

    async fn search_once(&self, query: &str) -> Result<Vec<LookupInfo>> {
        let client = self.authed_client().await?;
        let response: SearchResponse = client
            .get_with_params("/search", &[("query", query)])
            .await?;

        Ok(response
            .data
            .iter()
            .filter_map(|r| {
                let kind = match r.record_type.as_str() {
                    "movie" => Some(MediaKind::Movie),
                    "series" => Some(MediaKind::TvSeries),
                    _ => return None,
                };
                let title = r.name.clone()?;
                let year = r.year.as_deref().and_then(|y| y.parse().ok());
                Some(
                    LookupInfo::new(r.tvdb_id.clone().unwrap_or_default(), title, "tvdb")
                        .with_kind(kind)
                        .with_year(year),
                )
            })
            .collect())
    }
}

#[async_trait]
impl MetadataLookup for TvdbLookup {
    fn id(&self) -> &'static str {
        "tvdb"
    }

    fn name(&self) -> &'static str {
        "TVDB"
    }

    async fn search(&self, query: &str) -> Result<Vec<LookupInfo>> {
        match self.search_once(query).await {
            // Token expired; log in again and retry once
            Err(LookupError::Api { status: 401, .. }) => {
                debug!("TVDB token rejected, re-authenticating");
                self.drop_token().await;
                self.search_once(query).await
            }
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchRecord>,
}

#[derive(Debug, Deserialize)]
struct SearchRecord {
    #[serde(default, rename = "type")]
    record_type: String,
    name: Option<String>,
    year: Option<String>,
    tvdb_id: Option<String>,
}
