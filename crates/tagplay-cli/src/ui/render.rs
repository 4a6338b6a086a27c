//! TUI rendering functions.
//!
//! Rendering is a pure function of the [`View`]; nothing here touches the
//! session.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use tagplay_core::{Affordance, Screen};

/// Everything one frame needs.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub screen: &'a Screen,
    pub tag_id: Option<&'a str>,
    pub stream_url: &'a str,
    /// External player name, if playback happens outside the terminal.
    pub player: Option<&'a str>,
}

/// Draw the full UI.
pub fn draw(frame: &mut Frame<'_>, view: &View<'_>) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, view, header);
    match view.screen {
        Screen::Loading => draw_banner(frame, body, "Loading..."),
        Screen::Error { message } => draw_error(frame, body, message),
        Screen::Authorizing => draw_banner(frame, body, "Authorizing..."),
        Screen::Active {
            video_visible: true,
            ..
        } => draw_video(frame, view, body),
        Screen::Idle | Screen::Active { .. } | Screen::Ended => draw_poster(frame, view, body),
    }
    draw_footer(frame, view.screen, footer);
}

/// Key hints for the footer, leftmost first.
pub fn key_hints(screen: &Screen) -> Vec<String> {
    let mut hints = Vec::with_capacity(4);
    if let Some(affordance) = screen.affordance() {
        hints.push(format!("Enter: {}", affordance.label()));
    }
    if screen.is_video_visible() {
        hints.push("x: Close".to_string());
    }
    hints.push("r: Reload".to_string());
    hints.push("q: Quit".to_string());
    hints
}

fn draw_header(frame: &mut Frame<'_>, view: &View<'_>, area: Rect) {
    let tag = view
        .tag_id
        .map_or_else(|| " | No rental tag".to_string(), |t| format!(" | Tag: {t}"));
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "tagplay",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(tag),
    ]));
    frame.render_widget(header, area);
}

fn draw_footer(frame: &mut Frame<'_>, screen: &Screen, area: Rect) {
    let hints = key_hints(screen).join("  ");
    let footer = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(footer, area);
}

/// Rect of at most `width` x `height` centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn draw_banner(frame: &mut Frame<'_>, area: Rect, text: &str) {
    let banner = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(banner, centered(area, area.width, 1));
}

fn draw_error(frame: &mut Frame<'_>, area: Rect, message: &str) {
    let lines = vec![
        Line::from(Span::styled(
            "Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press r to try again",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, centered(area, area.width.min(60), 7));
}

fn draw_poster(frame: &mut Frame<'_>, view: &View<'_>, area: Rect) {
    let panel = centered(area, 40, 11);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Movie Poster ")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(panel);
    frame.render_widget(Clear, panel);
    frame.render_widget(block, panel);

    let [_, status, _, button] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let status_line = match view.screen {
        Screen::Active {
            hours_remaining, ..
        } => Line::from(Span::styled(
            format!("{hours_remaining} Hours Remaining"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Screen::Ended => Line::from(Span::styled(
            "Rental Ended",
            Style::default().fg(Color::DarkGray),
        )),
        _ => Line::from(""),
    };
    frame.render_widget(
        Paragraph::new(status_line).alignment(Alignment::Center),
        status,
    );

    if let Some(affordance) = view.screen.affordance() {
        frame.render_widget(button_widget(affordance), button);
    }
}

fn button_widget(affordance: Affordance) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        format!("[ {} ]", affordance.label()),
        Style::default()
            .fg(Color::White)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
}

fn draw_video(frame: &mut Frame<'_>, view: &View<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Now Playing ")
        .title_top(Line::from(" [X] ").right_aligned())
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let where_playing = view.player.map_or_else(
        || "Streaming (muted, autoplay)".to_string(),
        |p| format!("Playing in {p} (muted, autoplay)"),
    );
    let lines = vec![
        Line::from(Span::styled(
            where_playing,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            view.stream_url.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(body, centered(inner, inner.width, 3));
}
