use crate::api::Episode;
use crate::bot::callback::CallbackAction;
use crate::bot::session::EpisodeBatch;

/// Fixed page size of the episode list
pub const EPISODES_PER_PAGE: usize = 10;

/// One interactive control: a label plus the payload the transport will
/// echo back when it is tapped. Payloads always fit the transport ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub payload: String,
}

impl Control {
    fn new(label: &str, action: &CallbackAction) -> Self {
        Self {
            label: label.to_string(),
            payload: action.encode(),
        }
    }
}

/// A transport-neutral outgoing message: text plus rows of controls.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub text: String,
    pub controls: Vec<Vec<Control>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            controls: Vec::new(),
        }
    }
}

/// Number of pages needed for `total` episodes.
pub fn total_pages(total: usize) -> usize {
    total.div_ceil(EPISODES_PER_PAGE).max(1)
}

/// A clamped window over a batch's episode list.
#[derive(Debug)]
pub struct PageView<'a> {
    pub page: usize,
    pub total_pages: usize,
    pub episodes: &'a [Episode],
}

/// Compute the window for `page`, clamping into `[1, total_pages]`.
pub fn page_view(episodes: &[Episode], page: usize) -> PageView<'_> {
    let total_pages = total_pages(episodes.len());
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * EPISODES_PER_PAGE;
    let end = (start + EPISODES_PER_PAGE).min(episodes.len());

    PageView {
        page,
        total_pages,
        episodes: &episodes[start..end],
    }
}

/// Render one page of a cached batch with its navigation controls.
///
/// Controls: previous/next page where applicable, "enter range" always,
/// and "import all" always. Import-all carries the original result index
/// rather than the short id so it survives batch expiry.
pub fn render_page(batch: &EpisodeBatch, page: usize) -> Reply {
    let view = page_view(&batch.episodes, page);

    let page_info = if view.total_pages > 1 {
        format!(" (page {}/{})", view.page, view.total_pages)
    } else {
        String::new()
    };

    let mut lines = Vec::with_capacity(view.episodes.len());
    for (ordinal, episode) in view.episodes.iter().enumerate() {
        lines.push(format!(
            "{}. [Episode {}] {} ({})",
            ordinal + 1,
            episode.episode_index,
            episode.title,
            episode.provider
        ));
    }

    let text = format!(
        "✅ Found {} episodes{page_info}\n\
         💡 Range input supports: 1-10 / 1,10 / 1,5-10\n\n\
         📺 Episodes:\n{}",
        batch.total(),
        lines.join("\n")
    );

    let mut controls = Vec::new();

    if view.total_pages > 1 {
        let mut row = Vec::new();
        if view.page > 1 {
            row.push(Control::new(
                "⬅️ Previous",
                &CallbackAction::SwitchPage {
                    data_id: batch.short_id.clone(),
                    page: view.page - 1,
                },
            ));
        }
        if view.page < view.total_pages {
            row.push(Control::new(
                "Next ➡️",
                &CallbackAction::SwitchPage {
                    data_id: batch.short_id.clone(),
                    page: view.page + 1,
                },
            ));
        }
        controls.push(row);
    }

    controls.push(vec![Control::new(
        "📝 Enter episode range",
        &CallbackAction::InputRange {
            data_id: batch.short_id.clone(),
        },
    )]);

    controls.push(vec![Control::new(
        "🔗 Import all",
        &CallbackAction::ImportAll {
            result_index: batch.result_index,
        },
    )]);

    Reply { text, controls }
}

/// Placeholder swapped in while the first episode fetch is running, so a
/// second tap does nothing.
pub fn loading_controls() -> Vec<Vec<Control>> {
    vec![vec![Control::new("⏳ Loading episodes...", &CallbackAction::Noop)]]
}

/// Retry control left behind when the first fetch fails. No short id
/// exists yet, so the payload carries the result index again.
pub fn retry_controls(result_index: usize) -> Vec<Vec<Control>> {
    vec![vec![Control::new(
        "🔄 Fetch episodes again",
        &CallbackAction::FetchEpisodes {
            data_id: result_index.to_string(),
        },
    )]]
}

/// Message shown when the filtered episode list is empty: retry only, no
/// pagination or import controls.
pub fn no_episodes_reply(result_index: usize) -> Reply {
    Reply {
        text: "❌ This result has no usable episodes".to_string(),
        controls: retry_controls(result_index),
    }
}
