//! jokecache - a terminal joke reader that keeps working offline.
//!
//! Live jokes come from the configured API. A batch of jokes is cached on
//! disk and shown whenever the API can't be reached.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use jokecache_core::{Config, JokeView};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// File name prefix for the daily rolling TUI log
const LOG_FILE_PREFIX: &str = "jokecache.log";

const USAGE: &str = "\
Usage: jokecache [OPTION]

Without an option, starts the interactive terminal UI.

Options:
  --once           Fetch one joke and print it (falls back to the cache)
  --last           Print the last joke fetched live
  --clear-cache    Delete all cached jokes
  --write-config   Write the effective configuration to the config file
  -h, --help       Show this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tui,
    Once,
    Last,
    ClearCache,
    WriteConfig,
    Help,
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Tui),
        [arg] => match arg.as_str() {
            "--once" => Ok(Command::Once),
            "--last" => Ok(Command::Last),
            "--clear-cache" => Ok(Command::ClearCache),
            "--write-config" => Ok(Command::WriteConfig),
            "-h" | "--help" => Ok(Command::Help),
            other => anyhow::bail!("Unknown option: {}\n\n{}", other, USAGE),
        },
        _ => anyhow::bail!("Expected at most one option\n\n{}", USAGE),
    }
}

/// Log to stderr, for the one-shot commands.
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a daily file in `dir`, for the TUI which owns the terminal.
/// The returned guard flushes the writer when dropped.
fn init_file_tracing(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    // Config problems fall back to defaults; reported once logging is up
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    if command == Command::Tui {
        return run_tui(config, config_error).await;
    }

    init_tracing();
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    match command {
        Command::Once => print_once(config).await,
        Command::Last => print_last(config).await,
        Command::ClearCache => clear_cache(config).await,
        Command::WriteConfig => write_config(&config),
        Command::Tui | Command::Help => Ok(()),
    }
}

async fn run_tui(config: Config, config_error: Option<anyhow::Error>) -> Result<()> {
    let _log_guard = init_file_tracing(&config.cache_dir()?)?;
    info!("jokecache starting");
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start().await;
    app.watch_connectivity();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    app.stop_watching();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("jokecache shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Fetch one joke and print it; fall back to the cached batch when offline.
async fn print_once(config: Config) -> Result<()> {
    let mut app = App::new(config)?;
    app.controller.load_batch().await;
    app.controller.fetch_one().await;

    match app.controller.view() {
        JokeView::Live { joke, .. } | JokeView::Cached { joke, .. } => println!("{}", joke),
        JokeView::Error { message, fallback } => {
            eprintln!("{}", message);
            match fallback {
                Some(joke) => println!("{}", joke),
                None => anyhow::bail!("No cached jokes available"),
            }
        }
        JokeView::Empty => anyhow::bail!("No jokes available"),
    }
    Ok(())
}

async fn print_last(config: Config) -> Result<()> {
    let app = App::new(config)?;
    match app.controller.last_saved_joke().await {
        Some(joke) => println!("{}", joke),
        None => eprintln!("No joke has been fetched yet"),
    }
    Ok(())
}

async fn clear_cache(config: Config) -> Result<()> {
    let mut app = App::new(config)?;
    app.controller.clear_cache().await?;
    eprintln!("Cache cleared");
    Ok(())
}

fn write_config(config: &Config) -> Result<()> {
    config.save()?;
    eprintln!("Wrote {}", Config::config_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command(&args(&[])).unwrap(), Command::Tui);
        assert_eq!(parse_command(&args(&["--once"])).unwrap(), Command::Once);
        assert_eq!(parse_command(&args(&["--last"])).unwrap(), Command::Last);
        assert_eq!(
            parse_command(&args(&["--clear-cache"])).unwrap(),
            Command::ClearCache
        );
        assert_eq!(
            parse_command(&args(&["--write-config"])).unwrap(),
            Command::WriteConfig
        );
        assert_eq!(parse_command(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_command_rejects_unknown() {
        assert!(parse_command(&args(&["--bogus"])).is_err());
        assert!(parse_command(&args(&["--once", "--last"])).is_err());
    }
}
