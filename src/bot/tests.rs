//! Conversation flow integration tests

use crate::api::{
    self, AutoImportRequest, DanmakuApi, Episode, ImportReceipt, SearchResponse, SearchResult,
};
use crate::bot::flow::MessageEditor;
use crate::bot::page::{Control, Reply};
use async_trait::async_trait;
use std::sync::Mutex;

/// Scripted remote side: serves a fixed search result and episode list,
/// recording every import it receives.
struct StubApi {
    search_id: String,
    results: Vec<SearchResult>,
    episodes: Vec<Episode>,
    fail_episodes: bool,
    direct_calls: Mutex<Vec<(String, usize)>>,
    edited_calls: Mutex<Vec<(String, usize, Vec<Episode>)>>,
    auto_calls: Mutex<Vec<AutoImportRequest>>,
}

impl StubApi {
    fn new(episodes: Vec<Episode>) -> Self {
        Self {
            search_id: "search-1".to_string(),
            results: vec![SearchResult {
                title: "Frieren".to_string(),
                media_type: "tv_series".to_string(),
                provider: "bilibili".to_string(),
                year: Some(2023),
                season: Some(1),
                episode_count: episodes.len() as u32,
            }],
            episodes,
            fail_episodes: false,
            direct_calls: Mutex::new(Vec::new()),
            edited_calls: Mutex::new(Vec::new()),
            auto_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DanmakuApi for StubApi {
    async fn search(&self, _keyword: &str) -> api::Result<SearchResponse> {
        Ok(SearchResponse {
            search_id: self.search_id.clone(),
            results: self.results.clone(),
        })
    }

    async fn episodes(&self, _search_id: &str, _result_index: usize) -> api::Result<Vec<Episode>> {
        if self.fail_episodes {
            return Err(api::ApiError::Remote("episode backend down".to_string()));
        }
        Ok(self.episodes.clone())
    }

    async fn import_direct(
        &self,
        search_id: &str,
        result_index: usize,
    ) -> api::Result<ImportReceipt> {
        self.direct_calls
            .lock()
            .unwrap()
            .push((search_id.to_string(), result_index));
        Ok(ImportReceipt {
            task_id: Some("task-1".to_string()),
        })
    }

    async fn import_edited(
        &self,
        search_id: &str,
        result_index: usize,
        episodes: &[Episode],
    ) -> api::Result<ImportReceipt> {
        self.edited_calls.lock().unwrap().push((
            search_id.to_string(),
            result_index,
            episodes.to_vec(),
        ));
        Ok(ImportReceipt {
            task_id: Some("task-1".to_string()),
        })
    }

    async fn import_auto(&self, request: &AutoImportRequest) -> api::Result<ImportReceipt> {
        self.auto_calls.lock().unwrap().push(request.clone());
        Ok(ImportReceipt {
            task_id: Some("task-auto".to_string()),
        })
    }
}

/// Records every in-place edit a step performs on the tapped message.
#[derive(Default)]
struct RecordingEditor {
    controls: Mutex<Vec<Vec<Vec<Control>>>>,
    messages: Mutex<Vec<Reply>>,
}

#[async_trait]
impl MessageEditor for RecordingEditor {
    async fn replace_controls(&self, controls: Vec<Vec<Control>>) {
        self.controls.lock().unwrap().push(controls);
    }

    async fn replace_message(&self, reply: Reply) {
        self.messages.lock().unwrap().push(reply);
    }
}

fn episode(index: u32) -> Episode {
    Episode {
        provider: "bilibili".to_string(),
        episode_id: format!("ep-{index}"),
        title: format!("Episode title {index}"),
        episode_index: index,
    }
}

fn incomplete_episode(index: u32) -> Episode {
    Episode {
        provider: "bilibili".to_string(),
        episode_id: String::new(),
        title: format!("Broken {index}"),
        episode_index: index,
    }
}

/// First control whose label contains `needle`, by payload.
fn control_payload(reply: &Reply, needle: &str) -> String {
    reply
        .controls
        .iter()
        .flatten()
        .find(|c| c.label.contains(needle))
        .unwrap_or_else(|| panic!("no control labelled like {needle:?}"))
        .payload
        .clone()
}

mod dialog_tests {
    use crate::bot::flow::{DialogEvent, DialogState};

    #[test]
    fn test_range_submission_requires_a_pending_request() {
        assert!(DialogState::Idle.on(DialogEvent::SubmitRange).is_err());
        assert!(DialogState::Browsing.on(DialogEvent::SubmitRange).is_err());
        assert_eq!(
            DialogState::AwaitingRange
                .on(DialogEvent::SubmitRange)
                .unwrap(),
            DialogState::Idle
        );
    }

    #[test]
    fn test_cancel_is_legal_everywhere() {
        for state in [
            DialogState::Idle,
            DialogState::AwaitingKeyword,
            DialogState::Browsing,
            DialogState::AwaitingRange,
        ] {
            assert_eq!(state.on(DialogEvent::Cancel).unwrap(), DialogState::Idle);
        }
    }

    #[test]
    fn test_paging_works_while_awaiting_range() {
        assert_eq!(
            DialogState::AwaitingRange
                .on(DialogEvent::TurnPage)
                .unwrap(),
            DialogState::Browsing
        );
    }
}

mod session_tests {
    use super::episode;
    use crate::bot::session::Session;
    use crate::bot::short_id;

    #[test]
    fn test_insert_is_idempotent_for_the_same_result() {
        let mut session = Session::default();
        let first = session.insert_batch("search-1", 0, vec![episode(1)]);
        let second = session.insert_batch("search-1", 0, vec![episode(1), episode(2)]);

        assert_eq!(first, second);
        assert_eq!(first, short_id::compress("search-1", 0));
        assert_eq!(session.batch_count(), 1);
        // The newer batch replaced the older one
        assert_eq!(session.batch(&first).unwrap().total(), 2);
    }

    #[test]
    fn test_batch_resolves_truncated_prefixes() {
        let mut session = Session::default();
        let short_id = session.insert_batch("search-1", 3, vec![episode(1)]);

        assert!(session.batch(&short_id).is_some());
        assert!(session.batch(&short_id[..4]).is_some());
        assert!(session.batch("").is_none());
        assert!(session.batch("zzzz").is_none());
    }

    #[test]
    fn test_reset_drops_batches_and_state() {
        let mut session = Session::default();
        let short_id = session.insert_batch("search-1", 0, vec![episode(1)]);
        session.pending_batch = Some(short_id.clone());

        session.reset();

        assert_eq!(session.batch_count(), 0);
        assert!(session.batch(&short_id).is_none());
        assert!(session.pending_batch.is_none());
    }
}

mod flow_tests {
    use super::*;
    use crate::bot::callback::CallbackAction;
    use crate::bot::flow::{DialogState, Flow};
    use crate::bot::{BotError, session::UserId};
    use std::sync::Arc;

    const USER: UserId = 7;

    fn flow_with(api: StubApi) -> (Flow, Arc<StubApi>) {
        let api = Arc::new(api);
        (Flow::new(api.clone(), [USER]), api)
    }

    /// 25 raw episodes, 2 of them unusable, leaving 23 valid ones.
    fn mixed_episodes() -> Vec<Episode> {
        let mut episodes: Vec<Episode> = (1..=23).map(episode).collect();
        episodes.push(incomplete_episode(24));
        episodes.push(Episode {
            provider: String::new(),
            episode_id: "ep-25".to_string(),
            title: "No provider".to_string(),
            episode_index: 25,
        });
        episodes
    }

    #[tokio::test]
    async fn test_unknown_users_are_rejected() {
        let (flow, _) = flow_with(StubApi::new(Vec::new()));

        let err = flow.handle_search(999, "frieren").await.unwrap_err();
        assert!(matches!(err, BotError::NotAllowed));
    }

    #[tokio::test]
    async fn test_search_renders_one_message_per_result() {
        let (flow, _) = flow_with(StubApi::new(mixed_episodes()));

        let replies = flow.handle_search(USER, "frieren").await.unwrap();

        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("Found 1 results"));
        assert!(replies[1].text.contains("Frieren"));
        assert!(replies[1].text.contains("bilibili"));
        control_payload(&replies[1], "Import now");
        control_payload(&replies[1], "Pick episodes");
    }

    #[tokio::test]
    async fn test_full_selection_flow_submits_exactly_the_chosen_episodes() {
        let (flow, api) = flow_with(StubApi::new(mixed_episodes()));
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");

        // Fetch caches 23 valid episodes and renders page 1 of 3
        let replies = flow.handle_callback(USER, &fetch, &editor).await.unwrap();
        assert_eq!(replies.len(), 1);
        let page = &replies[0];
        assert!(page.text.contains("Found 23 episodes"));
        assert!(page.text.contains("(page 1/3)"));
        assert!(page.text.contains("1. [Episode 1]"));

        // The tapped control was disarmed while the fetch ran
        let recorded = editor.controls.lock().unwrap();
        assert!(recorded[0][0][0].label.contains("Loading"));
        drop(recorded);

        // Ask for range input, then type a mixed selection
        let input = control_payload(page, "range");
        let replies = flow.handle_callback(USER, &input, &editor).await.unwrap();
        assert!(replies[0].text.contains("23 available"));

        let replies = flow.handle_text(USER, "1,5-8").await.unwrap();
        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("Selected 5 episodes: 1, 5, 6, 7, 8"));
        assert!(replies[1].text.contains("Task id: task-1"));
        assert!(replies[1].text.contains("Episodes: 5"));

        // The remote side received full descriptors, ascending
        let calls = api.edited_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (search_id, result_index, episodes) = &calls[0];
        assert_eq!(search_id, "search-1");
        assert_eq!(*result_index, 0);
        let indices: Vec<u32> = episodes.iter().map(|e| e.episode_index).collect();
        assert_eq!(indices, vec![1, 5, 6, 7, 8]);
        assert!(episodes.iter().all(|e| !e.episode_id.is_empty()));
    }

    #[tokio::test]
    async fn test_paging_edits_the_message_in_place() {
        let (flow, _) = flow_with(StubApi::new(mixed_episodes()));
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");
        let replies = flow.handle_callback(USER, &fetch, &editor).await.unwrap();
        let next = control_payload(&replies[0], "Next");

        let replies = flow.handle_callback(USER, &next, &editor).await.unwrap();

        // No new message; the existing one was rewritten
        assert!(replies.is_empty());
        let messages = editor.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("(page 2/3)"));
        assert!(messages[0].text.contains("1. [Episode 11]"));
    }

    #[tokio::test]
    async fn test_all_invalid_episodes_leave_only_a_retry_control() {
        let (flow, _) = flow_with(StubApi::new(vec![
            incomplete_episode(1),
            incomplete_episode(2),
        ]));
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");
        let replies = flow.handle_callback(USER, &fetch, &editor).await.unwrap();

        assert!(replies[0].text.contains("no usable episodes"));
        assert_eq!(replies[0].controls.len(), 1);
        assert!(replies[0].controls[0][0].label.contains("again"));

        // Loading placeholder first, then the retry control
        let recorded = editor.controls.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(recorded[1][0][0].label.contains("again"));
    }

    #[tokio::test]
    async fn test_failed_fetch_reports_and_rearms_the_control() {
        let mut api = StubApi::new(mixed_episodes());
        api.fail_episodes = true;
        let (flow, _) = flow_with(api);
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");
        let replies = flow.handle_callback(USER, &fetch, &editor).await.unwrap();

        assert!(replies[0].text.contains("Failed to fetch episodes"));
        assert!(replies[0].text.contains("episode backend down"));
    }

    #[tokio::test]
    async fn test_import_all_needs_a_session() {
        let (flow, _) = flow_with(StubApi::new(Vec::new()));
        let editor = RecordingEditor::default();

        let payload = CallbackAction::ImportAll { result_index: 0 }.encode();
        let err = flow
            .handle_callback(USER, &payload, &editor)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::NoSession));
    }

    #[tokio::test]
    async fn test_import_all_works_without_episode_data() {
        let (flow, api) = flow_with(StubApi::new(mixed_episodes()));
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let import = control_payload(&replies[1], "Import now");
        let replies = flow.handle_callback(USER, &import, &editor).await.unwrap();

        assert!(replies[0].text.contains("Import submitted"));
        assert_eq!(
            *api.direct_calls.lock().unwrap(),
            vec![("search-1".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_garbage_payloads_surface_as_stale() {
        let (flow, _) = flow_with(StubApi::new(Vec::new()));
        let editor = RecordingEditor::default();

        let err = flow
            .handle_callback(USER, "definitely not json", &editor)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::StaleControl));
    }

    #[tokio::test]
    async fn test_invalid_range_input_reprompts_with_known_episodes() {
        let (flow, _) = flow_with(StubApi::new(mixed_episodes()));
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");
        let replies = flow.handle_callback(USER, &fetch, &editor).await.unwrap();
        let input = control_payload(&replies[0], "range");
        flow.handle_callback(USER, &input, &editor).await.unwrap();

        let replies = flow.handle_text(USER, "90-95").await.unwrap();
        assert!(replies[0].text.contains("No valid episodes"));
        assert!(replies[0].text.contains("Known episodes: 1-23"));

        // Still awaiting range input; a corrected attempt goes through
        let replies = flow.handle_text(USER, "2").await.unwrap();
        assert!(replies[0].text.contains("Selected 1 episodes: 2"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_user() {
        let api = Arc::new(StubApi::new(mixed_episodes()));
        let flow = Flow::new(api, [USER, 8]);
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");
        flow.handle_callback(USER, &fetch, &editor).await.unwrap();

        // The other user never searched; their dialog is still idle
        let replies = flow.handle_text(8, "1-5").await.unwrap();
        assert!(replies[0].text.contains("/search"));

        assert_eq!(
            flow.sessions().with_session(8, |session| session.state),
            DialogState::Idle
        );
        assert_eq!(
            flow.sessions().with_session(USER, |session| session.state),
            DialogState::Browsing
        );
    }

    #[tokio::test]
    async fn test_cancel_expires_cached_episode_data() {
        let (flow, _) = flow_with(StubApi::new(mixed_episodes()));
        let editor = RecordingEditor::default();

        let replies = flow.handle_search(USER, "frieren").await.unwrap();
        let fetch = control_payload(&replies[1], "Pick episodes");
        let replies = flow.handle_callback(USER, &fetch, &editor).await.unwrap();
        let next = control_payload(&replies[0], "Next");

        flow.handle_cancel(USER).await.unwrap();

        let err = flow
            .handle_callback(USER, &next, &editor)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::ExpiredBatch));
    }

    #[tokio::test]
    async fn test_empty_search_keyword_asks_for_one() {
        let (flow, _) = flow_with(StubApi::new(mixed_episodes()));

        let replies = flow.handle_search(USER, "  ").await.unwrap();
        assert!(replies[0].text.contains("Enter a keyword"));

        // The next free-text message is treated as the keyword
        let replies = flow.handle_text(USER, "frieren").await.unwrap();
        assert!(replies[0].text.contains("Found 1 results"));
    }
}

mod auto_import_tests {
    use super::*;
    use crate::api::{MediaKind, SearchType};
    use crate::bot::flow::Flow;
    use std::sync::Arc;

    const USER: i64 = 7;

    #[tokio::test]
    async fn test_tmdb_url_is_imported_by_id() {
        let api = Arc::new(StubApi::new(Vec::new()));
        let flow = Flow::new(api.clone(), [USER]);

        let replies = flow
            .handle_auto_import(USER, "https://www.themoviedb.org/tv/209867-frieren", None, None)
            .await
            .unwrap();
        assert!(replies[0].text.contains("Auto import submitted"));
        assert!(replies[0].text.contains("task-auto"));

        let calls = api.auto_calls.lock().unwrap();
        assert_eq!(calls[0].search_type, SearchType::Tmdb);
        assert_eq!(calls[0].search_term, "209867");
        assert_eq!(calls[0].media_type, Some(MediaKind::TvSeries));
    }

    #[tokio::test]
    async fn test_imdb_id_and_episode_granularity() {
        let api = Arc::new(StubApi::new(Vec::new()));
        let flow = Flow::new(api.clone(), [USER]);

        flow.handle_auto_import(USER, "tt22248376", Some(1), Some(3))
            .await
            .unwrap();

        let calls = api.auto_calls.lock().unwrap();
        assert_eq!(calls[0].search_type, SearchType::Imdb);
        assert_eq!(calls[0].search_term, "tt22248376");
        assert_eq!(calls[0].season, Some(1));
        assert_eq!(calls[0].episode, Some(3));
    }

    #[tokio::test]
    async fn test_plain_text_falls_back_to_keyword_search() {
        let api = Arc::new(StubApi::new(Vec::new()));
        let flow = Flow::new(api.clone(), [USER]);

        flow.handle_auto_import(USER, "sousou no frieren", None, None)
            .await
            .unwrap();

        let calls = api.auto_calls.lock().unwrap();
        assert_eq!(calls[0].search_type, SearchType::Keyword);
        assert_eq!(calls[0].search_term, "sousou no frieren");
        assert_eq!(calls[0].media_type, None);
    }
}

mod render_tests {
    use crate::api::TaskInfo;
    use crate::bot::flow::render_tasks;

    #[test]
    fn test_task_list_rendering() {
        let empty = render_tasks(&[]);
        assert!(empty.text.contains("No matching tasks"));

        let tasks = vec![TaskInfo {
            id: "task-1".to_string(),
            title: "Frieren".to_string(),
            status: "running".to_string(),
            progress: Some(40),
            description: None,
            created_at: None,
        }];
        let reply = render_tasks(&tasks);
        assert!(reply.text.contains("1. Frieren [running] 40%"));
        assert!(reply.text.contains("id: task-1"));
    }
}
