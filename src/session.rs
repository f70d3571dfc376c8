//! Calling-layer request state
//!
//! Per-view state machines over a shared [`JikanClient`]. A session owns the
//! cancellation token of its latest submission: submitting again cancels the
//! previous call, and an outcome is only applied if it still belongs to the
//! latest submission.

use crate::api::{JikanClient, DEFAULT_PAGE_SIZE};
use crate::cancel::CancellationToken;
use crate::error::ApiError;
use crate::types::{Anime, MalId, Pagination};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

/// Quiet period after the last keystroke before a search is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
    /// The request was withdrawn before it produced a result.
    Cancelled,
}

impl LoadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadStatus::Succeeded | LoadStatus::Failed | LoadStatus::Cancelled
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("page {page} is out of range (last page: {last})")]
    PageOutOfRange { page: u32, last: u32 },

    #[error("invalid letter filter '{0}' (expected A-Z)")]
    InvalidLetter(char),
}

/// Point-in-time copy of a [`SearchSession`].
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub term: String,
    /// Single uppercase initial; takes precedence over `term` when set.
    pub letter: Option<char>,
    pub page: u32,
    pub results: Vec<Anime>,
    pub pagination: Option<Pagination>,
    pub status: LoadStatus,
    pub error: Option<String>,
}

impl SearchSnapshot {
    /// The query actually sent upstream.
    pub fn query(&self) -> String {
        match self.letter {
            Some(letter) => letter.to_string(),
            None => self.term.clone(),
        }
    }
}

#[derive(Default)]
struct Submission {
    generation: u64,
    token: Option<CancellationToken>,
}

impl Submission {
    /// Withdraw the in-flight call but keep its generation, so it settles as `Cancelled`.
    fn cancel(&self) {
        if let Some(ref token) = self.token {
            token.cancel();
        }
    }

    /// Cancel whatever is in flight and open a new generation.
    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.generation += 1;
        self.generation
    }
}

struct SearchState {
    snapshot: SearchSnapshot,
    submission: Submission,
}

/// Search view state: term or letter, page, results and load status.
#[derive(Clone)]
pub struct SearchSession {
    client: JikanClient,
    page_size: u32,
    state: Arc<Mutex<SearchState>>,
}

impl SearchSession {
    pub fn new(client: JikanClient) -> Self {
        Self::with_page_size(client, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(client: JikanClient, page_size: u32) -> Self {
        Self {
            client,
            page_size,
            state: Arc::new(Mutex::new(SearchState {
                snapshot: SearchSnapshot {
                    page: 1,
                    ..SearchSnapshot::default()
                },
                submission: Submission::default(),
            })),
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.state.lock().snapshot.status
    }

    /// Replace the free-text term. Resets to page 1 and drops any letter filter.
    pub fn set_term(&self, term: impl Into<String>) {
        let mut state = self.state.lock();
        state.snapshot.term = term.into();
        state.snapshot.letter = None;
        state.snapshot.page = 1;
    }

    /// Search the current query at the current page, superseding any earlier submission.
    ///
    /// A blank query resets the session to `Idle` without issuing a request.
    /// Returns the status this submission ended in; a superseded submission
    /// reports `Cancelled` and leaves the session state untouched.
    pub async fn submit(&self) -> LoadStatus {
        let (generation, token, query, page) = {
            let mut state = self.state.lock();
            let generation = state.submission.supersede();
            let query = state.snapshot.query();

            if query.trim().is_empty() {
                let snapshot = &mut state.snapshot;
                snapshot.results.clear();
                snapshot.pagination = None;
                snapshot.error = None;
                snapshot.status = LoadStatus::Idle;
                snapshot.page = 1;
                return LoadStatus::Idle;
            }

            let token = CancellationToken::new();
            state.submission.token = Some(token.clone());
            state.snapshot.status = LoadStatus::Pending;
            state.snapshot.error = None;
            (generation, token, query, state.snapshot.page)
        };

        let outcome = self
            .client
            .search(&query, page, self.page_size, Some(&token))
            .await;

        let mut state = self.state.lock();
        if state.submission.generation != generation {
            debug!(query = %query, page, "Discarding superseded search result");
            return LoadStatus::Cancelled;
        }
        state.submission.token = None;

        let snapshot = &mut state.snapshot;
        snapshot.status = match outcome {
            Ok(response) => {
                snapshot.results = response.data;
                snapshot.pagination = response.pagination;
                LoadStatus::Succeeded
            }
            Err(ApiError::Cancelled) => LoadStatus::Cancelled,
            Err(err) => {
                snapshot.results.clear();
                snapshot.pagination = None;
                snapshot.error = Some(err.to_string());
                LoadStatus::Failed
            }
        };
        snapshot.status
    }

    /// Like [`submit`](Self::submit), but only after `delay` passes without a
    /// newer submission. Superseded during the wait, it issues no request and
    /// returns `Cancelled`.
    pub async fn submit_debounced(&self, delay: Duration) -> LoadStatus {
        let generation = self.state.lock().submission.supersede();
        sleep(delay).await;
        if self.state.lock().submission.generation != generation {
            debug!("Search superseded while debouncing");
            return LoadStatus::Cancelled;
        }
        self.submit().await
    }

    /// Move to `page` and search it. Only pages within the last known pagination are accepted.
    pub async fn go_to_page(&self, page: u32) -> Result<LoadStatus, SessionError> {
        {
            let mut state = self.state.lock();
            let last = state
                .snapshot
                .pagination
                .as_ref()
                .map(|p| p.last_visible_page)
                .unwrap_or(0);
            if page < 1 || page > last {
                return Err(SessionError::PageOutOfRange { page, last });
            }
            state.snapshot.page = page;
        }
        Ok(self.submit().await)
    }

    /// Filter by a single initial (A-Z, case-insensitive) and search it from page 1.
    pub async fn select_letter(&self, letter: char) -> Result<LoadStatus, SessionError> {
        if !letter.is_ascii_alphabetic() {
            return Err(SessionError::InvalidLetter(letter));
        }
        {
            let mut state = self.state.lock();
            state.snapshot.letter = Some(letter.to_ascii_uppercase());
            state.snapshot.page = 1;
        }
        Ok(self.submit().await)
    }

    /// Drop the letter filter and fall back to the free-text term.
    pub async fn clear_letter(&self) -> LoadStatus {
        {
            let mut state = self.state.lock();
            state.snapshot.letter = None;
            state.snapshot.page = 1;
        }
        self.submit().await
    }

    /// Withdraw the in-flight search. The session keeps its term and last
    /// results and ends in `Cancelled` once the call settles.
    pub fn cancel(&self) {
        self.state.lock().submission.cancel();
    }

    /// Reset everything and cancel the in-flight search, if any.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.submission.supersede();
        state.snapshot = SearchSnapshot {
            page: 1,
            ..SearchSnapshot::default()
        };
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailSnapshot {
    pub id: Option<MalId>,
    pub detail: Option<Anime>,
    pub status: LoadStatus,
    pub error: Option<String>,
}

struct DetailState {
    snapshot: DetailSnapshot,
    submission: Submission,
}

/// Detail view state for a single title.
#[derive(Clone)]
pub struct DetailSession {
    client: JikanClient,
    state: Arc<Mutex<DetailState>>,
}

impl DetailSession {
    pub fn new(client: JikanClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(DetailState {
                snapshot: DetailSnapshot::default(),
                submission: Submission::default(),
            })),
        }
    }

    pub fn snapshot(&self) -> DetailSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.state.lock().snapshot.status
    }

    /// Load `id`, superseding any earlier load.
    pub async fn load(&self, id: MalId) -> LoadStatus {
        let (generation, token) = {
            let mut state = self.state.lock();
            let generation = state.submission.supersede();
            let token = CancellationToken::new();
            state.submission.token = Some(token.clone());
            state.snapshot = DetailSnapshot {
                id: Some(id),
                detail: None,
                status: LoadStatus::Pending,
                error: None,
            };
            (generation, token)
        };

        let outcome = self.client.get_by_id_with_cancel(id, Some(&token)).await;

        let mut state = self.state.lock();
        if state.submission.generation != generation {
            debug!(mal_id = id, "Discarding superseded detail result");
            return LoadStatus::Cancelled;
        }
        state.submission.token = None;

        let snapshot = &mut state.snapshot;
        snapshot.status = match outcome {
            Ok(response) => {
                snapshot.detail = Some(response.data);
                LoadStatus::Succeeded
            }
            Err(ApiError::Cancelled) => LoadStatus::Cancelled,
            Err(err) => {
                snapshot.error = Some(err.to_string());
                LoadStatus::Failed
            }
        };
        snapshot.status
    }

    /// Withdraw the in-flight load; the session ends in `Cancelled`.
    pub fn cancel(&self) {
        self.state.lock().submission.cancel();
    }

    /// Cancel any in-flight load and forget the current title.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.submission.supersede();
        state.snapshot = DetailSnapshot::default();
    }
}
