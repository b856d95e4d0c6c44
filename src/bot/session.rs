use crate::api::{Episode, SearchResult};
use crate::bot::flow::DialogState;
use crate::bot::short_id;
use dashmap::DashMap;
use std::collections::HashMap;

/// Chat-platform user identifier
pub type UserId = i64;

/// The active search of one conversation
#[derive(Debug, Clone)]
pub struct SearchSession {
    /// Opaque token required by follow-up calls
    pub search_id: String,
    pub results: Vec<SearchResult>,
}

/// An immutable snapshot of one result's full episode list, keyed by its
/// short id. The search id is copied in because the session-level search
/// can be overwritten while the batch lives on.
#[derive(Debug, Clone)]
pub struct EpisodeBatch {
    pub short_id: String,
    pub result_index: usize,
    pub search_id: String,
    pub episodes: Vec<Episode>,
}

impl EpisodeBatch {
    pub fn total(&self) -> usize {
        self.episodes.len()
    }
}

/// Per-user scratch space for one conversation.
#[derive(Debug, Default)]
pub struct Session {
    pub search: Option<SearchSession>,
    pub state: DialogState,
    /// Short id the pending range input refers to
    pub pending_batch: Option<String>,
    batches: HashMap<String, EpisodeBatch>,
}

impl Session {
    /// Cache a fetched episode list, minting a collision-free short id.
    /// Returns the id the batch was registered under.
    pub fn insert_batch(
        &mut self,
        search_id: &str,
        result_index: usize,
        episodes: Vec<Episode>,
    ) -> String {
        let short_id = short_id::mint(search_id, result_index, |candidate| {
            self.batches
                .get(candidate)
                .is_some_and(|b| b.search_id != search_id || b.result_index != result_index)
        });

        let batch = EpisodeBatch {
            short_id: short_id.clone(),
            result_index,
            search_id: search_id.to_string(),
            episodes,
        };
        self.batches.insert(short_id.clone(), batch);
        short_id
    }

    /// Resolve a short id back to its batch. Accepts truncated prefixes:
    /// a control that had to shorten its id still resolves as long as the
    /// prefix is unambiguous among live batches.
    pub fn batch(&self, id: &str) -> Option<&EpisodeBatch> {
        if id.is_empty() {
            return None;
        }
        if let Some(batch) = self.batches.get(id) {
            return Some(batch);
        }

        let mut matches = self.batches.values().filter(|b| b.short_id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(batch), None) => Some(batch),
            _ => None,
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Drop everything tied to the previous search. Called when a new
    /// search supersedes the session or the user cancels.
    pub fn reset(&mut self) {
        self.search = None;
        self.state = DialogState::Idle;
        self.pending_batch = None;
        self.batches.clear();
    }
}

/// Concurrency-safe map of per-user sessions.
///
/// Each handler borrows exactly one user's session; nothing is shared
/// across users.
#[derive(Default)]
pub struct SessionStore {
    inner: DashMap<UserId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the user's session, creating it on first contact.
    pub fn with_session<R>(&self, user: UserId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut entry = self.inner.entry(user).or_default();
        f(entry.value_mut())
    }

    pub fn clear(&self, user: UserId) {
        self.inner.remove(&user);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
