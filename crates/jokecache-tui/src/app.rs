//! Application state management for the jokecache TUI.
//!
//! `App` owns the `JokeController` and everything the render loop needs
//! around it: overlay state, status messages, the connectivity subscription
//! and the channel background fetches report back on. Network requests never
//! run on the render loop; they are spawned and their results are applied in
//! `check_background_tasks`.

use std::sync::Arc;

use anyhow::{Context, Result};
use jokecache_core::api::{fetch_batch_from, BatchOutcome};
use jokecache_core::{
    AdvanceAction, ApiClient, ApiError, Config, ConnectivityEvent, ConnectivityMonitor,
    ConnectivitySubscription, FetchStatus, FetchTicket, FileStore, Joke, JokeCache,
    JokeController, TcpProbe,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// One prefetch plus a few queued live fetches at most.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Results sent back from spawned network tasks.
enum TaskResult {
    /// A live fetch finished
    Joke(FetchTicket, Result<Joke, ApiError>),
    /// A batch prefetch finished
    Batch(BatchOutcome),
}

/// Main application state container
pub struct App {
    pub config: Config,
    pub controller: JokeController,

    pub state: AppState,
    pub status_message: Option<String>,
    /// Last reported reachability, `None` until the first probe.
    pub connected: Option<bool>,
    pub fetches_in_flight: usize,
    pub prefetch_in_flight: bool,

    probe_target: Option<(String, u16)>,
    connectivity: Option<ConnectivitySubscription>,
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    /// Build the app from configuration: HTTP client, file store, controller.
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(config.api_url.clone(), config.request_timeout())
            .context("Failed to build HTTP client")?;
        let probe_target = api.probe_target();
        if probe_target.is_none() {
            warn!(url = %api.url(), "Cannot derive a host to probe from the API URL");
        }

        let store =
            FileStore::new(config.cache_dir()?).context("Failed to open cache directory")?;
        debug!(dir = ?store.dir(), "Cache store opened");

        let controller = JokeController::new(
            Arc::new(api),
            JokeCache::new(Arc::new(store)),
            config.controller_options(),
        );

        let mut app = Self::with_controller(config, controller);
        app.probe_target = probe_target;
        Ok(app)
    }

    /// Build the app around an existing controller.
    pub fn with_controller(config: Config, controller: JokeController) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            config,
            controller,
            state: AppState::Normal,
            status_message: None,
            connected: None,
            fetches_in_flight: 0,
            prefetch_in_flight: false,
            probe_target: None,
            connectivity: None,
            task_rx,
            task_tx,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load the persisted batch; if there is none, prefetch in the background.
    pub async fn start(&mut self) {
        let loaded = self.controller.load_batch().await;
        info!(cached = loaded.len(), "Loaded cached jokes");
        if self.controller.needs_prefetch() {
            self.request_prefetch();
        }
    }

    /// Subscribe to connectivity changes for the API host.
    pub fn watch_connectivity(&mut self) {
        let Some((host, port)) = self.probe_target.clone() else {
            return;
        };
        let probe = TcpProbe::new(host, port);
        self.connectivity = Some(ConnectivityMonitor::spawn(
            probe,
            self.config.probe_interval(),
        ));
    }

    /// Release the connectivity subscription.
    pub fn stop_watching(&mut self) {
        if let Some(subscription) = self.connectivity.take() {
            subscription.unsubscribe();
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// The "next joke" action.
    pub fn advance(&mut self) {
        match self.controller.next_action() {
            AdvanceAction::Fetch => self.request_fetch(),
            AdvanceAction::Rotate => self.controller.rotate(),
            AdvanceAction::Disabled => {
                self.status_message = Some("Only one cached joke available".to_string());
            }
        }
    }

    /// Start a live fetch on a background task.
    pub fn request_fetch(&mut self) {
        let ticket = self.controller.begin_fetch();
        let source = self.controller.source();
        let tx = self.task_tx.clone();
        self.fetches_in_flight += 1;
        self.status_message = Some("Fetching joke...".to_string());

        tokio::spawn(async move {
            let result = source.fetch_joke().await;
            Self::send_result(&tx, TaskResult::Joke(ticket, result)).await;
        });
    }

    /// Start a batch prefetch on a background task. Ignored while one is running.
    pub fn request_prefetch(&mut self) {
        if self.prefetch_in_flight {
            return;
        }
        let source = self.controller.source();
        let count = self.controller.options().batch_size;
        let tx = self.task_tx.clone();
        self.prefetch_in_flight = true;
        info!(count, "Starting batch prefetch");

        tokio::spawn(async move {
            let outcome = fetch_batch_from(source.as_ref(), count).await;
            Self::send_result(&tx, TaskResult::Batch(outcome)).await;
        });
    }

    /// Reload the cached batch from disk.
    pub async fn reload_batch(&mut self) {
        let loaded = self.controller.load_batch().await;
        self.status_message = Some(if loaded.is_empty() {
            "No cached jokes on disk".to_string()
        } else {
            format!("Reloaded {} cached jokes", loaded.len())
        });
    }

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send task result - channel closed");
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply finished background tasks and pending connectivity events.
    pub async fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_task_result(result).await;
        }

        let mut events = Vec::new();
        if let Some(ref mut subscription) = self.connectivity {
            while let Some(event) = subscription.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            self.process_connectivity_event(event).await;
        }
    }

    async fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Joke(ticket, result) => {
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                match self.controller.complete_fetch(ticket, result).await {
                    FetchStatus::Updated | FetchStatus::Failed => self.status_message = None,
                    FetchStatus::Stale => {}
                }
            }
            TaskResult::Batch(outcome) => {
                self.prefetch_in_flight = false;
                match self.controller.complete_prefetch(outcome).await {
                    Ok(count) => {
                        self.status_message = Some(format!("Cached {} jokes for offline use", count));
                    }
                    Err(e) => debug!(error = %e, "Background prefetch failed"),
                }
            }
        }
    }

    async fn process_connectivity_event(&mut self, event: ConnectivityEvent) {
        self.connected = Some(event.is_connected);
        self.controller.on_connectivity_change(event).await;
        if !event.is_connected {
            self.status_message = Some("Offline - showing cached jokes".to_string());
        }
    }

    pub fn is_busy(&self) -> bool {
        self.fetches_in_flight > 0 || self.prefetch_in_flight
    }
}
