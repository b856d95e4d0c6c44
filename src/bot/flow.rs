use crate::api::{AutoImportRequest, DanmakuApi, Episode, SearchType, TaskInfo};
use crate::bot::{
    BotError, Result,
    callback::CallbackAction,
    import,
    input::{self, InputKind},
    page::{self, Control, Reply},
    select::{self, RangeSelection},
    session::{SearchSession, SessionStore, UserId},
};
use crate::lookup::LookupManager;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where one user's conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Nothing pending; commands and result controls are accepted
    #[default]
    Idle,
    /// `/search` was issued without a keyword
    AwaitingKeyword,
    /// An episode list is on screen
    Browsing,
    /// The user was asked to type an episode range
    AwaitingRange,
}

/// Conversation events that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogEvent {
    StartSearch,
    SubmitKeyword,
    FetchEpisodes,
    TurnPage,
    RequestRange,
    SubmitRange,
    Cancel,
}

impl DialogEvent {
    const fn name(self) -> &'static str {
        match self {
            Self::StartSearch => "start search",
            Self::SubmitKeyword => "submit keyword",
            Self::FetchEpisodes => "fetch episodes",
            Self::TurnPage => "turn page",
            Self::RequestRange => "request range input",
            Self::SubmitRange => "submit range",
            Self::Cancel => "cancel",
        }
    }
}

impl DialogState {
    /// The transition table. Anything not listed is an illegal transition
    /// and surfaces as an error instead of a silent fallthrough.
    pub(crate) fn on(self, event: DialogEvent) -> Result<Self> {
        use DialogEvent as E;
        use DialogState as S;

        match (self, event) {
            (_, E::StartSearch) => Ok(S::AwaitingKeyword),
            (_, E::SubmitKeyword) => Ok(S::Idle),
            (_, E::FetchEpisodes) => Ok(S::Browsing),
            (S::Idle | S::Browsing | S::AwaitingRange, E::TurnPage) => Ok(S::Browsing),
            (S::Idle | S::Browsing | S::AwaitingRange, E::RequestRange) => Ok(S::AwaitingRange),
            (S::AwaitingRange, E::SubmitRange) => Ok(S::Idle),
            (_, E::Cancel) => Ok(S::Idle),
            (state, event) => Err(BotError::IllegalTransition {
                state,
                event: event.name(),
            }),
        }
    }
}

/// Handle to the message whose controls a step may rewrite.
///
/// The transport implements this for the message a control was tapped on,
/// so the core can swap in a loading placeholder before a slow remote call
/// and rewrite the page in place when paging.
#[async_trait::async_trait]
pub trait MessageEditor: Send + Sync {
    /// Replace only the control rows of the originating message
    async fn replace_controls(&self, controls: Vec<Vec<Control>>);

    /// Replace the whole originating message (text and controls)
    async fn replace_message(&self, reply: Reply);
}

/// The conversation core: dispatches user steps against per-user sessions
/// and the remote danmaku capabilities.
pub struct Flow {
    api: Arc<dyn DanmakuApi>,
    sessions: SessionStore,
    allowed: HashSet<UserId>,
    lookups: Option<Arc<LookupManager>>,
}

impl Flow {
    pub fn new(api: Arc<dyn DanmakuApi>, allowed: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            api,
            sessions: SessionStore::new(),
            allowed: allowed.into_iter().collect(),
            lookups: None,
        }
    }

    /// Attach auxiliary metadata lookups (used to prefill auto-import)
    pub fn with_lookups(mut self, lookups: Arc<LookupManager>) -> Self {
        self.lookups = Some(lookups);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn is_allowed(&self, user: UserId) -> bool {
        self.allowed.contains(&user)
    }

    fn ensure_allowed(&self, user: UserId) -> Result<()> {
        if self.is_allowed(user) {
            Ok(())
        } else {
            warn!("rejecting user {user}: not on the allow list");
            Err(BotError::NotAllowed)
        }
    }

    /// The `/start` and `/help` text.
    pub fn welcome() -> Reply {
        Reply::text(
            "👋 Welcome to the danmaku import bot!\n\
             Authorized users can use these commands:\n\n\
             📥 Media import\n\
             /search <keyword> - search media (e.g. /search one piece)\n\
             /auto <keyword | TMDB URL | tt-id> - auto import\n\n\
             Other\n\
             /tasks - list import tasks\n\
             /help - show this message\n\
             /cancel - cancel the current step",
        )
    }

    /// Entry point for `/search`. An empty keyword asks for one and parks
    /// the dialog in [`DialogState::AwaitingKeyword`].
    pub async fn handle_search(&self, user: UserId, keyword: &str) -> Result<Vec<Reply>> {
        self.ensure_allowed(user)?;

        let keyword = keyword.trim();
        if keyword.is_empty() {
            self.sessions.with_session(user, |session| -> Result<()> {
                session.state = session.state.on(DialogEvent::StartSearch)?;
                Ok(())
            })?;
            return Ok(vec![Reply::text(
                "Enter a keyword to search for (e.g. one piece):",
            )]);
        }

        self.run_search(user, keyword).await
    }

    async fn run_search(&self, user: UserId, keyword: &str) -> Result<Vec<Reply>> {
        info!("user {user} searching for {keyword:?}");

        let response = match self.api.search(keyword).await {
            Ok(response) => response,
            Err(err) => {
                return Ok(vec![Reply::text(format!("❌ Search failed: {err}"))]);
            }
        };

        if response.search_id.is_empty() {
            return Ok(vec![Reply::text(
                "❌ The search response carried no search id; importing is not possible",
            )]);
        }
        if response.results.is_empty() {
            return Ok(vec![Reply::text(format!(
                "❌ Nothing found for \"{keyword}\""
            ))]);
        }

        let total = response.results.len();
        let mut replies = Vec::with_capacity(total + 1);
        replies.push(Reply::text(format!(
            "✅ Found {total} results, use the buttons to import:"
        )));

        for (index, result) in response.results.iter().enumerate() {
            let year = result
                .year
                .map_or_else(|| "unknown".to_string(), |y| y.to_string());
            let season = result
                .season
                .map_or_else(|| "unknown".to_string(), |s| s.to_string());

            let text = format!(
                "[{}/{total}] {}\n\
                 • Type: {} | Source: {}\n\
                 • Year: {year} | Season: {season}\n\
                 • Episodes: {}",
                index + 1,
                result.title,
                result.media_type,
                result.provider,
                result.episode_count
            );

            let controls = vec![vec![
                Control {
                    label: "🔗 Import now".to_string(),
                    payload: CallbackAction::ImportAll {
                        result_index: index,
                    }
                    .encode(),
                },
                Control {
                    label: "🔗 Pick episodes".to_string(),
                    payload: CallbackAction::FetchEpisodes {
                        data_id: index.to_string(),
                    }
                    .encode(),
                },
            ]];

            replies.push(Reply { text, controls });
        }

        // A new search supersedes everything cached for the previous one
        self.sessions.with_session(user, |session| -> Result<()> {
            session.reset();
            session.state = DialogState::Idle.on(DialogEvent::SubmitKeyword)?;
            session.search = Some(SearchSession {
                search_id: response.search_id.clone(),
                results: response.results.clone(),
            });
            Ok(())
        })?;

        Ok(replies)
    }

    /// Dispatch a tapped control.
    pub async fn handle_callback(
        &self,
        user: UserId,
        payload: &str,
        editor: &dyn MessageEditor,
    ) -> Result<Vec<Reply>> {
        self.ensure_allowed(user)?;
        debug!("user {user} callback payload: {payload}");

        match CallbackAction::decode(payload)? {
            CallbackAction::Noop => Ok(Vec::new()),
            CallbackAction::ImportAll { result_index } => {
                self.import_all(user, result_index).await
            }
            CallbackAction::FetchEpisodes { data_id } => {
                self.fetch_episodes(user, &data_id, editor).await
            }
            CallbackAction::SwitchPage { data_id, page } => {
                self.switch_page(user, &data_id, page, editor).await
            }
            CallbackAction::InputRange { data_id } => self.request_range(user, &data_id),
        }
    }

    async fn import_all(&self, user: UserId, result_index: usize) -> Result<Vec<Reply>> {
        // Deliberately not tied to a batch: this control must keep working
        // after episode data expires, so only the session search is needed.
        let search_id = self
            .sessions
            .with_session(user, |session| {
                session.search.as_ref().map(|s| s.search_id.clone())
            })
            .ok_or(BotError::NoSession)?;

        Ok(vec![
            import::submit_all(self.api.as_ref(), &search_id, result_index).await,
        ])
    }

    async fn fetch_episodes(
        &self,
        user: UserId,
        data_id: &str,
        editor: &dyn MessageEditor,
    ) -> Result<Vec<Reply>> {
        // Before the first fetch the control carries the raw result index
        let result_index: usize = data_id.parse().map_err(|_| BotError::StaleControl)?;

        let search_id = self
            .sessions
            .with_session(user, |session| {
                session.search.as_ref().map(|s| s.search_id.clone())
            })
            .ok_or(BotError::NoSession)?;

        // Disarm the tapped control while the fetch runs
        editor.replace_controls(page::loading_controls()).await;

        let episodes = match self.api.episodes(&search_id, result_index).await {
            Ok(episodes) => episodes,
            Err(err) => {
                editor.replace_controls(page::retry_controls(result_index)).await;
                return Ok(vec![Reply::text(format!(
                    "❌ Failed to fetch episodes: {err}"
                ))]);
            }
        };

        let total_raw = episodes.len();
        let episodes: Vec<Episode> = episodes.into_iter().filter(Episode::is_complete).collect();
        if episodes.len() < total_raw {
            warn!(
                "dropped {} incomplete episodes from result {result_index}",
                total_raw - episodes.len()
            );
        }

        if episodes.is_empty() {
            editor.replace_controls(page::retry_controls(result_index)).await;
            return Ok(vec![page::no_episodes_reply(result_index)]);
        }

        info!(
            "caching {} episodes for result {result_index} of user {user}",
            episodes.len()
        );

        let batch = self.sessions.with_session(user, |session| -> Result<_> {
            let short_id = session.insert_batch(&search_id, result_index, episodes);
            session.state = session.state.on(DialogEvent::FetchEpisodes)?;
            // just inserted under this id
            session.batch(&short_id).cloned().ok_or(BotError::ExpiredBatch)
        })?;

        Ok(vec![page::render_page(&batch, 1)])
    }

    async fn switch_page(
        &self,
        user: UserId,
        data_id: &str,
        page_number: usize,
        editor: &dyn MessageEditor,
    ) -> Result<Vec<Reply>> {
        let batch = self.sessions.with_session(user, |session| -> Result<_> {
            let batch = session
                .batch(data_id)
                .cloned()
                .ok_or(BotError::ExpiredBatch)?;
            session.state = session.state.on(DialogEvent::TurnPage)?;
            Ok(batch)
        })?;

        // Paging rewrites the episode message in place
        editor.replace_message(page::render_page(&batch, page_number)).await;
        Ok(Vec::new())
    }

    fn request_range(&self, user: UserId, data_id: &str) -> Result<Vec<Reply>> {
        let total = self.sessions.with_session(user, |session| -> Result<usize> {
            let batch = session
                .batch(data_id)
                .cloned()
                .ok_or(BotError::ExpiredBatch)?;
            session.state = session.state.on(DialogEvent::RequestRange)?;
            session.pending_batch = Some(batch.short_id.clone());
            Ok(batch.total())
        })?;

        Ok(vec![Reply::text(format!(
            "📝 Enter the episodes to import ({total} available):\n\
             Examples: 1-10 / 1,10 / 1,5-10"
        ))])
    }

    /// Dispatch free text. What it means depends on the dialog state.
    pub async fn handle_text(&self, user: UserId, text: &str) -> Result<Vec<Reply>> {
        self.ensure_allowed(user)?;

        let state = self.sessions.with_session(user, |session| session.state);
        match state {
            DialogState::AwaitingKeyword => {
                let keyword = text.trim();
                if keyword.is_empty() {
                    return Ok(vec![Reply::text(
                        "❌ The keyword cannot be empty, try again:",
                    )]);
                }
                self.run_search(user, keyword).await
            }
            DialogState::AwaitingRange => self.submit_range(user, text).await,
            DialogState::Idle | DialogState::Browsing => Ok(vec![Reply::text(
                "Use /search <keyword> to look for media, or /help for all commands.",
            )]),
        }
    }

    async fn submit_range(&self, user: UserId, text: &str) -> Result<Vec<Reply>> {
        let batch = self.sessions.with_session(user, |session| {
            session
                .pending_batch
                .as_deref()
                .and_then(|id| session.batch(id))
                .cloned()
        });
        let Some(batch) = batch else {
            return Err(BotError::ExpiredBatch);
        };

        let valid: BTreeSet<u32> = batch.episodes.iter().map(|e| e.episode_index).collect();

        let (indices, invalid) = match select::parse_selection(text, &valid) {
            RangeSelection::Empty => {
                return Ok(vec![Reply::text(
                    "❌ Empty input, try again (examples: 1-10 / 1,10 / 1,5-10)",
                )]);
            }
            RangeSelection::NoneValid { invalid } => {
                let mut message = "❌ No valid episodes in that input, try again\n".to_string();
                if !invalid.is_empty() {
                    message.push_str(&format!("Invalid fragments: {}\n", invalid.join(", ")));
                }
                message.push_str(&format!("Known episodes: {}", summarize_indices(&valid)));
                return Ok(vec![Reply::text(message)]);
            }
            RangeSelection::Selected { indices, invalid } => (indices, invalid),
        };

        let mut replies = Vec::new();
        let mut confirmation = format!(
            "✅ Selected {} episodes: {}\n",
            indices.len(),
            indices
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        if !invalid.is_empty() {
            confirmation.push_str(&format!("⚠️ Ignored: {}\n", invalid.join(", ")));
        }
        confirmation.push_str("💡 Starting the import");
        replies.push(Reply::text(confirmation));

        // Resolve indices back to full descriptors, in ascending order
        let selected: Vec<Episode> = indices
            .iter()
            .filter_map(|index| {
                batch
                    .episodes
                    .iter()
                    .find(|e| e.episode_index == *index)
                    .cloned()
            })
            .collect();

        self.sessions.with_session(user, |session| -> Result<()> {
            session.state = session.state.on(DialogEvent::SubmitRange)?;
            session.pending_batch = None;
            Ok(())
        })?;

        replies.push(
            import::submit_selected(
                self.api.as_ref(),
                &batch.search_id,
                batch.result_index,
                &selected,
            )
            .await,
        );

        Ok(replies)
    }

    /// `/auto`: import by keyword, TMDB URL, or IMDB id, optionally down
    /// to one season/episode.
    pub async fn handle_auto_import(
        &self,
        user: UserId,
        text: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<Vec<Reply>> {
        self.ensure_allowed(user)?;

        let mut request = match input::classify(text) {
            InputKind::TmdbUrl {
                media_kind,
                tmdb_id,
            } => AutoImportRequest::new(SearchType::Tmdb, tmdb_id).with_media_type(media_kind),
            InputKind::ImdbId(id) => AutoImportRequest::new(SearchType::Imdb, id),
            InputKind::Keyword(keyword) => {
                let mut request = AutoImportRequest::new(SearchType::Keyword, keyword.clone());
                if let Some(lookups) = &self.lookups
                    && let Some(kind) = lookups.suggest_media_kind(&keyword).await
                {
                    debug!("lookup suggested media kind {kind:?} for {keyword:?}");
                    request = request.with_media_type(kind);
                }
                request
            }
        };

        if let (Some(season), Some(episode)) = (season, episode) {
            request = request.with_episode(season, episode);
        }

        info!("user {user} auto-importing {:?}", request.search_term);

        match self.api.import_auto(&request).await {
            Ok(receipt) => {
                let task_id = receipt.task_id.unwrap_or_else(|| "n/a".to_string());
                Ok(vec![Reply::text(format!(
                    "🎉 Auto import submitted!\n\
                     • Task id: {task_id}\n\
                     • Tip: check /tasks later for progress"
                ))])
            }
            Err(err) => Ok(vec![Reply::text(format!(
                "❌ Auto import failed: {err}\n\
                 • Tip: try a more specific title or an exact id"
            ))]),
        }
    }

    /// `/cancel`: drop everything the conversation accumulated.
    pub async fn handle_cancel(&self, user: UserId) -> Result<Vec<Reply>> {
        self.ensure_allowed(user)?;
        self.sessions.clear(user);
        Ok(vec![Reply::text("✅ Cancelled")])
    }
}

/// Render a task list the way `/tasks` shows it.
pub fn render_tasks(tasks: &[TaskInfo]) -> Reply {
    if tasks.is_empty() {
        return Reply::text("📋 No matching tasks");
    }

    let mut lines = vec!["📋 Import tasks".to_string()];
    for (ordinal, task) in tasks.iter().enumerate() {
        let mut line = format!("{}. {} [{}]", ordinal + 1, task.title, task.status);
        if let Some(progress) = task.progress {
            line.push_str(&format!(" {progress}%"));
        }
        line.push_str(&format!("\n   id: {}", task.id));
        if let Some(created) = task.created_at {
            line.push_str(&format!(" • {}", created.format("%Y-%m-%d %H:%M")));
        }
        lines.push(line);
    }

    Reply::text(lines.join("\n"))
}

/// Compact display of a valid index set, collapsing runs into ranges.
fn summarize_indices(indices: &BTreeSet<u32>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut run: Option<(u32, u32)> = None;

    for &index in indices {
        match run {
            Some((start, end)) if index == end + 1 => run = Some((start, index)),
            Some((start, end)) => {
                parts.push(format_run(start, end));
                run = Some((index, index));
            }
            None => run = Some((index, index)),
        }
    }
    if let Some((start, end)) = run {
        parts.push(format_run(start, end));
    }

    parts.join(", ")
}

fn format_run(start: u32, end: u32) -> String {
    if start == end {
        format!("{start}")
    } else {
        format!("{start}-{end}")
    }
}
