use jokecache_core::{AdvanceAction, Joke, JokeView};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(8),    // Joke card
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_joke(frame, app, centered_card(chunks[1]));
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  jokecache";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 2)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

/// The joke card takes 80% of the width, like a centered column.
fn centered_card(area: Rect) -> Rect {
    let width = (area.width as u32 * 4 / 5) as u16;
    let x = area.x + (area.width - width) / 2;
    Rect::new(x, area.y, width, area.height)
}

fn joke_lines(joke: &Joke, setup: Style, punchline: Style) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(joke.setup.clone(), setup)),
        Line::from(""),
        Line::from(Span::styled(joke.punchline.clone(), punchline)),
    ]
}

fn advance_hint(label: &str, enabled: bool) -> Line<'static> {
    if enabled {
        Line::from(vec![
            Span::styled("[n] ", styles::help_key_style()),
            Span::styled(label.to_string(), styles::help_desc_style()),
        ])
    } else {
        Line::from(Span::styled(
            format!("[n] {} (only one cached joke)", label),
            styles::muted_style(),
        ))
    }
}

fn render_joke(frame: &mut Frame, app: &App, area: Rect) {
    let (title, focused, mut lines) = match app.controller.view() {
        JokeView::Empty => {
            let text = if app.is_busy() {
                "Fetching jokes..."
            } else {
                "No jokes yet. Press [f] to fetch one."
            };
            let lines = vec![Line::from(Span::styled(text, styles::muted_style()))];
            (" Jokes ".to_string(), false, lines)
        }
        JokeView::Live { joke, .. } => {
            let mut lines = joke_lines(joke, styles::setup_style(), styles::punchline_style());
            lines.push(Line::from(""));
            lines.push(advance_hint("Get Another Joke", true));
            (" Live ".to_string(), true, lines)
        }
        JokeView::Cached {
            joke,
            position,
            total,
            can_advance,
        } => {
            let mut lines = joke_lines(joke, styles::setup_style(), styles::punchline_style());
            lines.push(Line::from(""));
            lines.push(advance_hint("Get Another Joke", can_advance));
            (format!(" Cached {}/{} ", position, total), false, lines)
        }
        JokeView::Error { message, fallback } => {
            let mut lines = vec![Line::from(Span::styled(
                message.to_string(),
                styles::error_style(),
            ))];
            if let Some(joke) = fallback {
                lines.push(Line::from(""));
                lines.extend(joke_lines(joke, styles::muted_style(), styles::muted_style()));
            }
            lines.push(Line::from(""));
            let mut controls = vec![
                Span::styled("[f] ", styles::help_key_style()),
                Span::styled("Try again", styles::help_desc_style()),
            ];
            if app.controller.next_action() == AdvanceAction::Rotate {
                controls.push(Span::raw("   "));
                controls.push(Span::styled("[n] ", styles::help_key_style()));
                controls.push(Span::styled("Next cached joke", styles::help_desc_style()));
            }
            lines.push(Line::from(controls));
            (" Offline ".to_string(), false, lines)
        }
    };

    if app.fetches_in_flight > 0 {
        lines.push(Line::from(Span::styled("Fetching...", styles::highlight_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .title(Span::styled(title, styles::title_style()));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

pub fn connection_label(connected: Option<bool>) -> &'static str {
    match connected {
        Some(true) => "● online",
        Some(false) => "○ offline",
        None => "◌ checking",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[n]ext | [f]etch | [q]uit";
    let connection = connection_label(app.connected);
    let connection_style = match app.connected {
        Some(true) => styles::success_style(),
        Some(false) => styles::error_style(),
        None => styles::muted_style(),
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => match app.controller.state().fetched_at() {
            Some(at) => format!(" Last fetched {} ", at.format("%H:%M:%S")),
            None => String::from(" "),
        },
    };
    let right_text = format!(" {} ", shortcuts);

    let used = left_text.chars().count() + connection.chars().count() + right_text.len() + 1;
    let padding = (area.width as usize).saturating_sub(used);

    let status_line = Line::from(vec![
        Span::styled(format!(" {}", connection), connection_style),
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 15, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  jokecache", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        help_line("n / Space", "Next joke (live or cached)"),
        help_line("f", "Fetch a live joke"),
        help_line("r", "Reload cached jokes"),
        help_line("p", "Refresh the offline batch"),
        help_line("?", "Toggle help"),
        help_line("q / Esc", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 6, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
