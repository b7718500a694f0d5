//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right => app.advance(),
        KeyCode::Char('f') => app.request_fetch(),
        KeyCode::Char('r') => app.reload_batch().await,
        KeyCode::Char('p') => {
            if app.prefetch_in_flight {
                app.status_message = Some("Already refreshing the offline batch".to_string());
            } else {
                app.request_prefetch();
                app.status_message = Some("Refreshing the offline batch...".to_string());
            }
        }
        _ => {}
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use jokecache_core::{
        ApiError, Config, ControllerOptions, Joke, JokeCache, JokeController, JokeSource,
        MemoryStore,
    };

    struct FixedSource;

    #[async_trait]
    impl JokeSource for FixedSource {
        async fn fetch_joke(&self) -> Result<Joke, ApiError> {
            Ok(Joke::new("Why?", "Because."))
        }
    }

    fn test_app() -> App {
        let controller = JokeController::new(
            Arc::new(FixedSource),
            JokeCache::new(Arc::new(MemoryStore::new())),
            ControllerOptions::default(),
        );
        App::with_controller(Config::default(), controller)
    }

    async fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::from(code)).await.unwrap()
    }

    #[tokio::test]
    async fn test_quit_requires_confirmation() {
        let mut app = test_app();

        assert!(!press(&mut app, KeyCode::Char('q')).await);
        assert_eq!(app.state, AppState::ConfirmingQuit);

        assert!(!press(&mut app, KeyCode::Char('n')).await);
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Esc).await;
        assert!(press(&mut app, KeyCode::Char('y')).await);
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_help_toggles() {
        let mut app = test_app();

        press(&mut app, KeyCode::Char('?')).await;
        assert_eq!(app.state, AppState::ShowingHelp);

        // Other keys are swallowed while help is open
        press(&mut app, KeyCode::Char('f')).await;
        assert_eq!(app.fetches_in_flight, 0);

        press(&mut app, KeyCode::Char('?')).await;
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_fetch_and_next_start_live_fetches() {
        let mut app = test_app();

        press(&mut app, KeyCode::Char('f')).await;
        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.fetches_in_flight, 2);
    }

    #[tokio::test]
    async fn test_prefetch_key_reports_progress() {
        let mut app = test_app();

        press(&mut app, KeyCode::Char('p')).await;
        assert!(app.prefetch_in_flight);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Refreshing the offline batch...")
        );

        press(&mut app, KeyCode::Char('p')).await;
        assert_eq!(
            app.status_message.as_deref(),
            Some("Already refreshing the offline batch")
        );
    }

    #[tokio::test]
    async fn test_reload_with_empty_store() {
        let mut app = test_app();

        press(&mut app, KeyCode::Char('r')).await;
        assert_eq!(app.status_message.as_deref(), Some("No cached jokes on disk"));
    }
}
