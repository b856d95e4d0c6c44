mod callback;
mod flow;
mod import;
mod input;
mod page;
mod select;
mod session;
mod short_id;
#[cfg(test)]
mod tests;

pub use callback::{CALLBACK_DATA_MAX_LEN, CallbackAction, STALE_DATA_ID};
pub use flow::{DialogState, Flow, MessageEditor, render_tasks};
pub use input::{InputKind, classify};
pub use page::{Control, EPISODES_PER_PAGE, Reply, total_pages};
pub use select::{RangeSelection, parse_selection};
pub use session::{EpisodeBatch, SearchSession, Session, SessionStore, UserId};
pub use short_id::{SHORT_ID_LEN, compress};

use crate::api::ApiError;

/// Bot result type
pub type Result<T> = std::result::Result<T, BotError>;

/// Conversation-level errors.
///
/// Display text is what the user sees; every variant tells them how to
/// recover instead of crashing the conversation.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("you are not allowed to use this bot")]
    NotAllowed,

    /// Malformed or truncated-beyond-recovery control payload
    #[error("this control has expired, request the episode list again")]
    StaleControl,

    #[error("no search session found, run a search first")]
    NoSession,

    #[error("episode data has expired, request the episode list again")]
    ExpiredBatch,

    #[error("{state:?} cannot handle {event}")]
    IllegalTransition {
        state: flow::DialogState,
        event: &'static str,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}
