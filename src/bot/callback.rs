use crate::bot::{BotError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Hard ceiling the chat transport puts on control payloads
pub const CALLBACK_DATA_MAX_LEN: usize = 64;

/// Sentinel data id meaning "state lost, re-fetch from scratch"
pub const STALE_DATA_ID: &str = "stale";

/// Loading-placeholder payload; taps on it are ignored
const NOOP_PAYLOAD: &str = "empty";

// Safe id truncation lengths per control type. Pagination payloads carry a
// page number and the longest action tag, so they get the least room.
const PAGE_SAFE_ID_LEN: usize = 17;
const INPUT_SAFE_ID_LEN: usize = 29;
const FETCH_SAFE_ID_LEN: usize = 29;

const ACTION_IMPORT: &str = "import_media";
const ACTION_FETCH: &str = "get_media_episode";
const ACTION_SWITCH_PAGE: &str = "switch_episode_page";
const ACTION_INPUT_RANGE: &str = "start_input_range";
// Accepted on input for compatibility with messages rendered by older builds
const ACTION_LIST_LEGACY: &str = "get_episodes";

/// One interactive-control payload.
///
/// Two vocabularies exist in the wild: legacy long field names
/// (`action`/`data_id`/`current_page`/`result_index`) and the short form
/// (`a`/`d`/`p`/`r`). Decoding accepts both; encoding only ever emits the
/// short form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Import a whole search result; carries the original result index so
    /// it keeps working after the episode batch expires
    ImportAll { result_index: usize },
    /// First-time episode fetch for a result (data id = result index as text)
    FetchEpisodes { data_id: String },
    /// Move to another page of a cached batch
    SwitchPage { data_id: String, page: usize },
    /// Ask the user to type an episode range for a cached batch
    InputRange { data_id: String },
    /// Inert placeholder shown while a fetch is in flight
    Noop,
}

#[derive(Serialize)]
struct Wire<'a> {
    a: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r: Option<usize>,
}

#[derive(Deserialize)]
struct RawWire {
    #[serde(alias = "action")]
    a: Option<String>,
    #[serde(alias = "data_id")]
    d: Option<String>,
    #[serde(alias = "current_page")]
    p: Option<usize>,
    #[serde(alias = "result_index")]
    r: Option<usize>,
}

impl CallbackAction {
    /// Serialize to a payload guaranteed to fit the transport ceiling.
    ///
    /// If the serialized form is too long the data id is truncated to the
    /// control's safe prefix length; if even that cannot fit, the id is
    /// replaced with [`STALE_DATA_ID`] so the control degrades to a
    /// "start over" prompt instead of disappearing.
    pub fn encode(&self) -> String {
        let (tag, data_id, page, result_index, safe_len) = match self {
            Self::ImportAll { result_index } => {
                (ACTION_IMPORT, None, None, Some(*result_index), 0)
            }
            Self::FetchEpisodes { data_id } => {
                (ACTION_FETCH, Some(data_id.as_str()), None, None, FETCH_SAFE_ID_LEN)
            }
            Self::SwitchPage { data_id, page } => (
                ACTION_SWITCH_PAGE,
                Some(data_id.as_str()),
                Some(*page),
                None,
                PAGE_SAFE_ID_LEN,
            ),
            Self::InputRange { data_id } => (
                ACTION_INPUT_RANGE,
                Some(data_id.as_str()),
                None,
                None,
                INPUT_SAFE_ID_LEN,
            ),
            Self::Noop => return NOOP_PAYLOAD.to_string(),
        };

        let full = serialize(tag, data_id, page, result_index);
        if full.len() <= CALLBACK_DATA_MAX_LEN {
            return full;
        }

        if let Some(id) = data_id {
            let prefix: String = id.chars().take(safe_len).collect();
            warn!(
                "control payload over {CALLBACK_DATA_MAX_LEN} bytes, truncating id to {} chars",
                prefix.len()
            );
            let truncated = serialize(tag, Some(&prefix), page, result_index);
            if truncated.len() <= CALLBACK_DATA_MAX_LEN {
                return truncated;
            }
        }

        warn!("control payload cannot fit even truncated, degrading to stale sentinel");
        serialize(tag, Some(STALE_DATA_ID), page, result_index)
    }

    /// Parse an incoming payload, accepting both vocabularies.
    pub fn decode(payload: &str) -> Result<Self> {
        if payload == NOOP_PAYLOAD {
            return Ok(Self::Noop);
        }

        let raw: RawWire = serde_json::from_str(payload).map_err(|_| BotError::StaleControl)?;
        let action = raw.a.ok_or(BotError::StaleControl)?;

        match action.as_str() {
            ACTION_IMPORT => {
                let result_index = raw.r.ok_or(BotError::StaleControl)?;
                Ok(Self::ImportAll { result_index })
            }
            ACTION_FETCH => {
                let data_id = non_stale(raw.d)?;
                Ok(Self::FetchEpisodes { data_id })
            }
            ACTION_SWITCH_PAGE | ACTION_LIST_LEGACY => {
                let data_id = non_stale(raw.d)?;
                Ok(Self::SwitchPage {
                    data_id,
                    page: raw.p.unwrap_or(1),
                })
            }
            ACTION_INPUT_RANGE => {
                let data_id = non_stale(raw.d)?;
                Ok(Self::InputRange { data_id })
            }
            _ => Err(BotError::StaleControl),
        }
    }
}

fn serialize(tag: &str, data_id: Option<&str>, page: Option<usize>, result_index: Option<usize>) -> String {
    let wire = Wire {
        a: tag,
        d: data_id,
        p: page,
        r: result_index,
    };
    // Wire is a plain field struct, serialization cannot fail
    serde_json::to_string(&wire).unwrap_or_else(|_| NOOP_PAYLOAD.to_string())
}

fn non_stale(data_id: Option<String>) -> Result<String> {
    match data_id {
        Some(id) if !id.is_empty() && id != STALE_DATA_ID => Ok(id),
        _ => Err(BotError::StaleControl),
    }
}
