use crate::api::{DanmakuApi, Episode};
use crate::bot::page::Reply;
use tracing::{info, warn};

/// Submit an explicit episode selection for import.
///
/// The request carries the full descriptor of every episode (provider,
/// episode id, title, index) because the remote side needs provider and
/// episode id to locate the source stream. Never retried automatically;
/// failure text includes the remote message and a retry suggestion.
pub async fn submit_selected(
    api: &dyn DanmakuApi,
    search_id: &str,
    result_index: usize,
    episodes: &[Episode],
) -> Reply {
    info!(
        "submitting import of {} episodes (result {result_index})",
        episodes.len()
    );

    match api.import_edited(search_id, result_index, episodes).await {
        Ok(receipt) => {
            let task_id = receipt.task_id.unwrap_or_else(|| "n/a".to_string());
            Reply::text(format!(
                "🎉 Import submitted!\n\
                 • Task id: {task_id}\n\
                 • Episodes: {}\n\
                 • Tip: check /tasks later for progress",
                episodes.len()
            ))
        }
        Err(err) => {
            warn!("batch import failed: {err}");
            Reply::text(format!(
                "❌ Import failed: {err}\n\
                 • Tip: if this keeps happening, fetch the episode list again and retry"
            ))
        }
    }
}

/// Submit a whole search result for import, without enumerating episodes.
/// Used by the "import all" control at any point in the flow.
pub async fn submit_all(api: &dyn DanmakuApi, search_id: &str, result_index: usize) -> Reply {
    info!("submitting full import (result {result_index})");

    match api.import_direct(search_id, result_index).await {
        Ok(receipt) => {
            let task_id = receipt.task_id.unwrap_or_else(|| "n/a".to_string());
            Reply::text(format!(
                "🎉 Import submitted!\n\
                 • Task id: {task_id}\n\
                 • Tip: check /tasks later for progress"
            ))
        }
        Err(err) => {
            warn!("direct import failed: {err}");
            Reply::text(format!(
                "❌ Import failed: {err}\n\
                 • Tip: if this keeps happening, run the search again and retry"
            ))
        }
    }
}
