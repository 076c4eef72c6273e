use std::borrow::Cow;

use super::state::{AppState, FeedStatus};
use super::UiState;
use crate::client::{GameReport, PipelineState, ReviewEntry};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use scraper::Html;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw(f: &mut Frame, state: &AppState, ui: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0], ui.spinner_frame);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    draw_reviews(f, state, ui, body[0]);

    let detail = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(body[1]);
    draw_summary(f, state.reviews.get(ui.selected), detail[0]);
    draw_pipeline(f, state, ui, detail[1]);

    draw_logs(f, state, chunks[2]);
    draw_footer(f, state, chunks[3]);
}

fn spinner(frame: u8) -> char {
    SPINNER_FRAMES[(frame as usize) % SPINNER_FRAMES.len()]
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    let feed_status = match &state.feed {
        FeedStatus::Loading => Span::styled(
            format!("{} loading", spinner(spinner_frame)),
            Style::default().fg(Color::Cyan),
        ),
        FeedStatus::Ready => Span::styled(
            format!("{} reviews", state.reviews.len()),
            Style::default().fg(Color::Green),
        ),
        FeedStatus::Failed(_) => Span::styled("DOWN", Style::default().fg(Color::Red)),
    };

    let activity = match state.pipeline.stage() {
        Some(stage) => Span::styled(
            format!(" {} {}", spinner(spinner_frame), stage.label()),
            Style::default().fg(Color::Cyan),
        ),
        None => Span::styled(" idle", Style::default().fg(Color::DarkGray)),
    };

    let line = Line::from(vec![
        Span::styled(" Stitch", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" | Feed: ", Style::default().fg(Color::DarkGray)),
        feed_status,
        Span::styled(" | Search:", Style::default().fg(Color::DarkGray)),
        activity,
        Span::styled(" | Up: ", Style::default().fg(Color::DarkGray)),
        Span::raw(state.uptime()),
    ]);

    let block = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_reviews(f: &mut Frame, state: &AppState, ui: &UiState, area: Rect) {
    let max_width = area.width.saturating_sub(4) as usize;
    let visible = area.height.saturating_sub(2) as usize;
    let offset = (ui.selected + 1).saturating_sub(visible);
    let busy = state.is_busy();

    let lines: Vec<Line> = match &state.feed {
        FeedStatus::Failed(msg) => vec![Line::from(Span::styled(
            format!(" {}", msg),
            Style::default().fg(Color::Red),
        ))],
        _ => state
            .reviews
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, entry)| {
                let selected = i == ui.selected;
                let style = match (busy, selected) {
                    (true, true) => Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                    (true, false) => Style::default().fg(Color::DarkGray),
                    (false, true) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    (false, false) => Style::default(),
                };
                let marker = if selected { "> " } else { "  " };
                let title = truncate_with_ellipsis(&entry.title, max_width);
                Line::from(Span::styled(format!("{}{}", marker, title), style))
            })
            .collect(),
    };

    let block = Block::default().title(" Reviews ").borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_summary(f: &mut Frame, entry: Option<&ReviewEntry>, area: Rect) {
    let lines = match entry {
        Some(entry) => {
            let mut byline = Vec::new();
            if let Some(ref author) = entry.item.author {
                byline.push(author.clone());
            }
            if let Some(date) = entry.item.published_date {
                byline.push(date.with_timezone(&chrono::Local).format("%b %d %Y").to_string());
            }
            let mut lines = vec![Line::from(Span::styled(
                entry.item.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            if !byline.is_empty() {
                lines.push(Line::from(Span::styled(
                    byline.join(" | "),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::raw(""));
            lines.push(Line::raw(strip_tags(&entry.item.description)));
            lines
        }
        None => vec![Line::styled(" No review selected", Style::default().fg(Color::DarkGray))],
    };

    let block = Block::default().title(" Summary ").borders(Borders::ALL);
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(para, area);
}

fn draw_pipeline(f: &mut Frame, state: &AppState, ui: &UiState, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let lines: Vec<Line> = match &state.pipeline {
        PipelineState::Idle => vec![Line::styled(
            " Press Enter to look up the highlighted game.",
            dim,
        )],
        PipelineState::FetchingId { title }
        | PipelineState::FetchingPriceScore { title, .. }
        | PipelineState::FetchingStreams { title, .. } => {
            let label = state.pipeline.stage().map(|s| s.label()).unwrap_or_default();
            vec![Line::from(vec![
                Span::styled(
                    format!(" {} {}", spinner(ui.spinner_frame), label),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(format!(": {}", title)),
            ])]
        }
        PipelineState::AwaitingManualCorrection { searched_title, .. } => vec![
            Line::from(format!(
                " Stitch couldn't find \"{}\". You might try searching yourself.",
                searched_title
            )),
            Line::raw(""),
            Line::from(vec![
                Span::styled(" Game Name: ", Style::default().fg(Color::Yellow)),
                Span::raw(ui.input.clone()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
        ],
        PipelineState::Done(report) => report_lines(report, area.width.saturating_sub(4) as usize),
        PipelineState::Error { stage, message } => vec![
            Line::styled(
                format!(" Search failed while {}.", stage.label()),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Line::styled(format!(" {}", message), Style::default().fg(Color::Red)),
        ],
    };

    let block = Block::default().title(" Steam + Twitch ").borders(Borders::ALL);
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn report_lines(report: &GameReport, max_width: usize) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!(" {}", report.title), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  (app {})", report.app_id), label),
        ]),
        Line::from(vec![
            Span::styled(" Header: ", label),
            Span::raw(truncate_with_ellipsis(&report.price_score.header_image_url, max_width).into_owned()),
        ]),
        Line::from(vec![
            Span::styled(" Cost: ", label),
            Span::styled(report.cost(), Style::default().fg(Color::Green)),
            Span::styled("   Metacritic: ", label),
            Span::styled(report.metacritic(), Style::default().fg(Color::Yellow)),
        ]),
        Line::raw(""),
    ];

    if report.streams.is_empty() {
        lines.push(Line::styled(" Nobody is streaming this right now.", label));
    } else {
        lines.push(Line::styled(" Live now:", label));
        for stream in &report.streams {
            let entry = format!("   {}  {}", stream.channel_name, stream.preview_image_url);
            lines.push(Line::raw(truncate_with_ellipsis(&entry, max_width).into_owned()));
        }
    }
    lines
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(2) as usize; // borders
    let visible_lines = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible_lines)
        .map(|l| {
            let color = match l.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                _ => Color::DarkGray,
            };
            let prefix = format!(" {} [{}] ", l.time, l.level);
            let msg_max = max_width.saturating_sub(prefix.len());
            let msg = truncate_with_ellipsis(&l.message, msg_max);
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(msg.into_owned()),
            ])
        })
        .collect();

    let block = Block::default().title(" Log ").borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let line = if matches!(state.pipeline, PipelineState::AwaitingManualCorrection { .. }) {
        Line::from(vec![
            Span::styled("  [Enter]", key),
            Span::raw(" search  "),
            Span::styled("[Esc]", key),
            Span::raw(" back  "),
        ])
    } else {
        Line::from(vec![
            Span::styled("  [q]", key),
            Span::raw("uit  "),
            Span::styled("[j/k]", key),
            Span::raw(" move  "),
            Span::styled("[Enter]", key),
            Span::raw(" look up  "),
            Span::styled("[r]", key),
            Span::raw("eload  "),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Text content of a feed description: markup dropped, entities decoded,
/// whitespace collapsed.
fn strip_tags(s: &str) -> String {
    let text: String = Html::parse_fragment(s).root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}
