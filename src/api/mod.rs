mod client;
mod traits;
mod types;

pub use client::DanmakuClient;
pub use traits::DanmakuApi;
pub use types::{
    AutoImportRequest, Episode, ImportReceipt, LibraryEntry, MediaKind, SearchResponse,
    SearchResult, SearchType, SourceEntry, TaskInfo,
};

/// API result type
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors from the remote danmaku API.
///
/// Every variant renders as a human-readable message; transport details
/// never leak past this module.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out, try again later")]
    Timeout,

    #[error("failed to reach the API, check the base URL")]
    Connect,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The envelope came back with `success: false`
    #[error("{0}")]
    Remote(String),

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Network(truncate_message(&err.to_string(), 100))
        }
    }
}

/// Clip remote error text to a displayable length.
pub(crate) fn truncate_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
