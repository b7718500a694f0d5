//! Joke cache controller.
//!
//! `JokeController` owns the display state (`CacheState`) and is the only
//! place it changes. It coordinates:
//!
//! - live fetches from a `JokeSource`, persisting each joke under `"joke"`
//! - the offline batch: loading it from the store, pre-fetching a fresh one,
//!   and rotating through it when no live joke is available
//! - reactions to connectivity changes
//!
//! Network work can run elsewhere: `begin_fetch`/`complete_fetch` and
//! `complete_prefetch` let a caller do the request on a background task and
//! hand the result back. Fetch completions carry a `FetchTicket` so an older
//! request finishing after a newer one is discarded.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::api::{fetch_batch_from, ApiError, BatchOutcome, JokeSource};
use crate::cache::JokeCache;
use crate::connectivity::ConnectivityEvent;
use crate::models::{Joke, JokeBatch, DEFAULT_BATCH_SIZE};

/// Message shown when a live fetch fails.
pub const FETCH_ERROR_MESSAGE: &str =
    "Failed to fetch joke. Please check your internet connection.";

/// Sequence number handed out for each live fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub batch_size: usize,
    pub keep_partial_batch: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            keep_partial_batch: false,
        }
    }
}

/// What the display shows and works from.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    current_joke: Option<Joke>,
    fetched_at: Option<DateTime<Local>>,
    last_error: Option<String>,
    batch: JokeBatch,
    /// Rotations since the batch was last replaced, for position display.
    rotations: usize,
}

impl CacheState {
    pub fn current_joke(&self) -> Option<&Joke> {
        self.current_joke.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.fetched_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn batch(&self) -> &JokeBatch {
        &self.batch
    }

    fn replace_batch(&mut self, batch: JokeBatch) {
        self.batch = batch;
        self.rotations = 0;
    }
}

/// Outcome of applying a live fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Updated,
    Failed,
    /// A newer fetch already completed; this result was dropped.
    Stale,
}

/// What the "next joke" action does in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceAction {
    Fetch,
    Rotate,
    /// Only one cached joke to show.
    Disabled,
}

/// Display contract consumed by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum JokeView<'a> {
    /// Nothing fetched and nothing cached yet.
    Empty,
    Live {
        joke: &'a Joke,
        fetched_at: Option<DateTime<Local>>,
    },
    Cached {
        joke: &'a Joke,
        /// 1-based position in the batch as originally ordered.
        position: usize,
        total: usize,
        can_advance: bool,
    },
    Error {
        message: &'a str,
        /// Joke still on screen below the error, if any.
        fallback: Option<&'a Joke>,
    },
}

pub struct JokeController {
    source: Arc<dyn JokeSource>,
    cache: JokeCache,
    options: ControllerOptions,
    state: CacheState,
    next_ticket: u64,
    last_applied: Option<FetchTicket>,
}

impl JokeController {
    pub fn new(source: Arc<dyn JokeSource>, cache: JokeCache, options: ControllerOptions) -> Self {
        Self {
            source,
            cache,
            options,
            state: CacheState::default(),
            next_ticket: 0,
            last_applied: None,
        }
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// Shared handle to the source, for running fetches on another task.
    pub fn source(&self) -> Arc<dyn JokeSource> {
        Arc::clone(&self.source)
    }

    // =========================================================================
    // Live fetch
    // =========================================================================

    /// Fetch one joke and apply it.
    pub async fn fetch_one(&mut self) -> FetchStatus {
        let ticket = self.begin_fetch();
        let result = self.source.fetch_joke().await;
        self.complete_fetch(ticket, result).await
    }

    /// Reserve a ticket for a live fetch about to start.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        FetchTicket(self.next_ticket)
    }

    /// Apply the result of the fetch started with `ticket`.
    ///
    /// Success replaces the current joke, clears the error and persists the
    /// joke. Failure keeps the current joke and sets the fixed error message.
    /// Persistence problems are logged only.
    pub async fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Joke, ApiError>,
    ) -> FetchStatus {
        if self.last_applied.is_some_and(|applied| ticket <= applied) {
            debug!(?ticket, last_applied = ?self.last_applied, "Discarding stale fetch result");
            return FetchStatus::Stale;
        }
        self.last_applied = Some(ticket);

        match result {
            Ok(joke) => {
                self.state.current_joke = Some(joke.clone());
                self.state.fetched_at = Some(Local::now());
                self.state.last_error = None;

                if let Err(e) = self.cache.save_joke(&joke).await {
                    warn!(error = %e, "Failed to persist fetched joke");
                }
                FetchStatus::Updated
            }
            Err(e) => {
                error!(error = %e, "Error fetching joke");
                self.state.last_error = Some(FETCH_ERROR_MESSAGE.to_string());
                FetchStatus::Failed
            }
        }
    }

    // =========================================================================
    // Offline batch
    // =========================================================================

    /// Read the persisted batch.
    ///
    /// A non-empty batch replaces the in-memory one and is returned. Missing
    /// or empty data, and read failures, return an empty batch and leave the
    /// in-memory batch alone.
    pub async fn load_batch(&mut self) -> JokeBatch {
        match self.cache.load_batch().await {
            Ok(batch) if !batch.is_empty() => {
                debug!(count = batch.len(), "Using persisted batch");
                self.state.replace_batch(batch.clone());
                batch
            }
            Ok(_) => JokeBatch::default(),
            Err(e) => {
                error!(error = %e, "Error fetching stored jokes");
                JokeBatch::default()
            }
        }
    }

    /// Fetch a fresh batch sequentially and persist it.
    ///
    /// Returns the number of jokes now in the batch. Any failed request aborts
    /// the whole batch unless partial batches are enabled.
    pub async fn prefetch_batch(&mut self) -> Result<usize, ApiError> {
        let outcome = fetch_batch_from(self.source.as_ref(), self.options.batch_size).await;
        self.complete_prefetch(outcome).await
    }

    /// Apply a batch fetched elsewhere.
    pub async fn complete_prefetch(&mut self, outcome: BatchOutcome) -> Result<usize, ApiError> {
        let BatchOutcome { jokes, error, .. } = outcome;

        if let Some(e) = error {
            error!(error = %e, fetched = jokes.len(), "Error fetching and saving jokes");
            if self.options.keep_partial_batch && !jokes.is_empty() {
                info!(count = jokes.len(), "Keeping partial batch");
                self.store_batch(JokeBatch::new(jokes)).await;
            }
            return Err(e);
        }

        let count = jokes.len();
        self.store_batch(JokeBatch::new(jokes)).await;
        info!(count, "Batch prefetched");
        Ok(count)
    }

    async fn store_batch(&mut self, batch: JokeBatch) {
        if let Err(e) = self.cache.save_batch(&batch).await {
            warn!(error = %e, "Failed to persist batch");
        }
        self.state.replace_batch(batch);
    }

    /// Whether startup should follow the load with a prefetch.
    pub fn needs_prefetch(&self) -> bool {
        self.state.batch.is_empty()
    }

    /// Move the shown cached joke to the back of the batch.
    pub fn rotate(&mut self) {
        if self.state.batch.can_rotate() {
            self.state.batch.rotate();
            self.state.rotations = (self.state.rotations + 1) % self.state.batch.len();
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load the persisted batch, then prefetch if nothing was there.
    pub async fn startup(&mut self) {
        let loaded = self.load_batch().await;
        if !loaded.is_empty() {
            return;
        }
        if let Err(e) = self.prefetch_batch().await {
            warn!(error = %e, "Startup prefetch failed");
        }
    }

    /// Going offline reloads the batch from the store. Coming online does nothing.
    pub async fn on_connectivity_change(&mut self, event: ConnectivityEvent) {
        if event.is_connected {
            debug!("Connection available");
            return;
        }
        info!("Connection lost, reloading cached jokes");
        self.load_batch().await;
    }

    // =========================================================================
    // Display
    // =========================================================================

    pub fn next_action(&self) -> AdvanceAction {
        // After a failed live fetch the batch takes over, even over an older live joke
        if self.state.last_error.is_some() && self.state.batch.can_rotate() {
            AdvanceAction::Rotate
        } else if self.state.current_joke.is_some() {
            AdvanceAction::Fetch
        } else if self.state.batch.can_rotate() {
            AdvanceAction::Rotate
        } else if self.state.batch.is_empty() {
            AdvanceAction::Fetch
        } else {
            AdvanceAction::Disabled
        }
    }

    /// The "next joke" action: a live fetch normally, a rotation when only
    /// cached jokes are on screen or the last live fetch failed.
    pub async fn advance(&mut self) -> AdvanceAction {
        let action = self.next_action();
        match action {
            AdvanceAction::Fetch => {
                self.fetch_one().await;
            }
            AdvanceAction::Rotate => self.rotate(),
            AdvanceAction::Disabled => {}
        }
        action
    }

    pub fn view(&self) -> JokeView<'_> {
        let state = &self.state;
        if let Some(message) = state.last_error.as_deref() {
            return JokeView::Error {
                message,
                fallback: state.batch.head().or(state.current_joke.as_ref()),
            };
        }
        if let Some(joke) = state.current_joke.as_ref() {
            return JokeView::Live {
                joke,
                fetched_at: state.fetched_at,
            };
        }
        match state.batch.head() {
            Some(joke) => JokeView::Cached {
                joke,
                position: state.rotations + 1,
                total: state.batch.len(),
                can_advance: state.batch.can_rotate(),
            },
            None => JokeView::Empty,
        }
    }

    /// Remove both persisted values and forget the in-memory batch.
    pub async fn clear_cache(&mut self) -> anyhow::Result<()> {
        self.cache.clear().await?;
        self.state.replace_batch(JokeBatch::default());
        info!("Cleared cached jokes");
        Ok(())
    }

    /// The joke persisted by the most recent successful live fetch.
    pub async fn last_saved_joke(&self) -> Option<Joke> {
        match self.cache.load_joke().await {
            Ok(joke) => joke,
            Err(e) => {
                warn!(error = %e, "Failed to read saved joke");
                None
            }
        }
    }
}
