use crate::api::{
    ApiError, Result,
    traits::DanmakuApi,
    truncate_message,
    types::{
        AutoImportRequest, Envelope, Episode, ImportReceipt, LibraryEntry, SearchResponse,
        SourceEntry, TaskInfo,
    },
};
use crate::config::DanmakuApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("danmaku-bot/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the remote danmaku service.
///
/// All endpoints share one envelope shape; anything other than a 2xx with
/// `success: true` collapses into an [`ApiError`].
#[derive(Clone)]
pub struct DanmakuClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DanmakuClient {
    pub fn new(config: &DanmakuApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.url(endpoint);
        debug!("GET {endpoint}");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::unwrap_envelope(endpoint, response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(endpoint);
        debug!("POST {endpoint}");

        let response = self
            .client
            .post(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::unwrap_envelope(endpoint, response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = truncate_message(&message, 100);
            error!("API request failed: {endpoint} -> {status}");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !envelope.success {
            let message = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            error!("API rejected request: {endpoint} -> {message}");
            return Err(ApiError::Remote(truncate_message(&message, 100)));
        }

        envelope
            .data
            .ok_or_else(|| ApiError::Decode(format!("{endpoint}: envelope without data")))
    }

    /// List the current library snapshot (`GET /library`)
    pub async fn library(&self) -> Result<Vec<LibraryEntry>> {
        self.get("/library", &[]).await
    }

    /// List danmaku sources attached to a library entry
    pub async fn sources(&self, media_id: i64) -> Result<Vec<SourceEntry>> {
        self.get(&format!("/library/anime/{media_id}/sources"), &[])
            .await
    }

    /// Trigger a danmaku refresh for one library episode
    pub async fn refresh_episode(&self, episode_id: i64) -> Result<()> {
        let _: serde_json::Value = self
            .post(
                &format!("/library/episode/{episode_id}/refresh"),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    /// List import tasks, optionally filtered by status
    pub async fn tasks(&self, status: Option<&str>) -> Result<Vec<TaskInfo>> {
        let params = match status {
            Some(status) => vec![("status", status.to_string())],
            None => Vec::new(),
        };
        self.get("/tasks", &params).await
    }
}

#[async_trait]
impl DanmakuApi for DanmakuClient {
    async fn search(&self, keyword: &str) -> Result<SearchResponse> {
        self.get("/search", &[("keyword", keyword.to_string())])
            .await
    }

    async fn episodes(&self, search_id: &str, result_index: usize) -> Result<Vec<Episode>> {
        self.get(
            "/episodes",
            &[
                ("searchId", search_id.to_string()),
                ("result_index", result_index.to_string()),
            ],
        )
        .await
    }

    async fn import_direct(&self, search_id: &str, result_index: usize) -> Result<ImportReceipt> {
        self.post(
            "/import/direct",
            &serde_json::json!({
                "searchId": search_id,
                "result_index": result_index,
            }),
        )
        .await
    }

    async fn import_edited(
        &self,
        search_id: &str,
        result_index: usize,
        episodes: &[Episode],
    ) -> Result<ImportReceipt> {
        self.post(
            "/import/edited",
            &serde_json::json!({
                "searchId": search_id,
                "result_index": result_index,
                "episodes": episodes,
            }),
        )
        .await
    }

    async fn import_auto(&self, request: &AutoImportRequest) -> Result<ImportReceipt> {
        self.post("/import/auto", request).await
    }
}
