//! UI rendering

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, StatefulWidget},
};
use std::time::{Duration, Instant};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::app::{App, TRENDING, Theme};
use super::rating::{RatingForm, RatingPhase};
use super::search::FacultyCard;
use crate::directory::{RatingAxis, Score};

const TITLE: &str = "VIT Ratings";
const PLACEHOLDER: &str = "Search by name (e.g. Sanat)...";

const FEATURES: [(&str, &str); 3] = [
    ("100% Anonymous", "Your identity is hidden. Review without fear."),
    (
        "Instant Updates",
        "Ratings update in real-time across the bot & web.",
    ),
    (
        "Student Driven",
        "Data sourced directly from the VIT community.",
    ),
];

/// Colours for one theme
struct Palette {
    bg: Color,
    text: Color,
    dim: Color,
    accent: Color,
    accent_alt: Color,
    selection_bg: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Reset,
                text: Color::White,
                dim: Color::DarkGray,
                accent: Color::LightRed,
                accent_alt: Color::Rgb(249, 115, 22),
                selection_bg: Color::Rgb(38, 38, 38),
            },
            Theme::Light => Self {
                bg: Color::Rgb(248, 250, 252),
                text: Color::Rgb(15, 23, 42),
                dim: Color::Rgb(100, 116, 139),
                accent: Color::Blue,
                accent_alt: Color::Cyan,
                selection_bg: Color::Rgb(226, 232, 240),
            },
        }
    }
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let palette = Palette::for_theme(app.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg)),
        frame.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title + theme
            Constraint::Length(1), // Search input
            Constraint::Length(1), // Spacer
            Constraint::Min(3),    // Body
            Constraint::Length(1), // Results count + query time
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Toast line
        ])
        .split(frame.area());

    render_header(frame, app, &palette, chunks[0]);
    render_search_input(frame, app, &palette, chunks[1]);
    render_body(frame, app, &palette, chunks[3]);
    render_results_count(frame, app, &palette, chunks[4]);
    render_status_bar(frame, app, &palette, chunks[5]);
    render_toast_line(frame, app, &palette, chunks[6]);

    if let Some(form) = app.session.rating.form() {
        render_rating_dialog(frame, form, &palette);
    }
}

fn render_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let title = Line::from(vec![
        Span::styled("  ★ ", Style::default().fg(palette.accent_alt)),
        Span::styled(
            TITLE,
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);

    let bracket = Style::default().fg(palette.dim);
    let theme = Line::from(vec![
        Span::styled("[", bracket),
        Span::styled(
            format!("theme: {}", app.theme.label()),
            Style::default().fg(palette.dim),
        ),
        Span::styled("]  ", bracket),
    ]);
    frame.render_widget(Paragraph::new(theme).alignment(Alignment::Right), area);
}

fn render_search_input(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let input = &app.search_input;
    let cursor_style = Style::default().fg(palette.bg).bg(palette.text);
    let text_style = Style::default().fg(palette.text);

    let split = input
        .text
        .char_indices()
        .nth(input.cursor)
        .map_or(input.text.len(), |(i, _)| i);
    let (before, after) = input.text.split_at(split);
    let cursor_char = after.chars().next();
    let after_cursor = cursor_char.map(|c| &after[c.len_utf8()..]).unwrap_or("");

    let mut spans = vec![Span::styled("▌ ", Style::default().fg(palette.accent))];
    if !before.is_empty() {
        spans.push(Span::styled(before, text_style));
    }
    if let Some(c) = cursor_char {
        spans.push(Span::styled(c.to_string(), cursor_style));
    } else {
        spans.push(Span::styled("█", Style::default().fg(palette.text)));
    }
    if !after_cursor.is_empty() {
        spans.push(Span::styled(after_cursor, text_style));
    }
    if input.text.is_empty() {
        spans.push(Span::styled(
            PLACEHOLDER,
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(frame: &mut Frame, app: &mut App, palette: &Palette, area: Rect) {
    let search = &app.session.search;

    if search.query().is_empty() {
        render_home(frame, app, palette, area);
    } else if let Some(started_at) = search.loading_since() {
        let line = Line::from(Span::styled(
            format!("{} Searching...", spinner_frame(started_at)),
            Style::default().fg(palette.accent_alt),
        ));
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    } else if !search.results().is_empty() {
        render_faculty_list(frame, app, palette, area);
    } else if search.has_settled() {
        let lines = vec![
            Line::from(Span::styled(
                format!("No faculty found matching \"{}\"", search.query()),
                Style::default().fg(palette.text),
            )),
            Line::from(Span::styled(
                "Try searching just the first name.",
                Style::default().fg(palette.dim),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }
}

/// Hero text, trending names and feature blurbs for the empty query
fn render_home(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let dim = Style::default().fg(palette.dim);
    let mut lines = vec![
        Line::from(Span::styled(
            "Find Your Faculty",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "The unofficial platform for honest student reviews. Anonymous. Fast. Reliable.",
            dim,
        )),
        Line::default(),
        Line::from(Span::styled(
            "Trending",
            Style::default()
                .fg(palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    for (i, name) in TRENDING.iter().enumerate() {
        let line = if i == app.trending_index {
            Line::from(vec![
                Span::styled("▌ ", Style::default().fg(palette.accent)),
                Span::styled(
                    *name,
                    Style::default()
                        .fg(palette.text)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
        } else {
            Line::from(Span::styled(format!("  {}", name), dim))
        };
        lines.push(line);
    }

    lines.push(Line::default());
    for (headline, blurb) in FEATURES {
        lines.push(Line::from(vec![
            Span::styled(headline, Style::default().fg(palette.text)),
            Span::styled(" · ", dim),
            Span::styled(blurb, dim),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_faculty_list(frame: &mut Frame, app: &mut App, palette: &Palette, area: Rect) {
    let selected_index = app.list_state.selected();

    let items: Vec<ListItem> = app
        .session
        .search
        .results()
        .iter()
        .enumerate()
        .map(|(i, faculty)| {
            let is_selected = selected_index == Some(i);
            let base_style = if is_selected {
                Style::default().fg(palette.text).bg(palette.selection_bg)
            } else {
                Style::default().fg(palette.text)
            };
            let prefix_style = if is_selected {
                Style::default().fg(palette.accent).bg(palette.selection_bg)
            } else {
                Style::default()
            };

            let lines = FacultyCard::from_faculty(faculty).to_tui_lines(
                is_selected,
                base_style,
                prefix_style,
                palette.accent,
            );
            let item = ListItem::new(lines);
            if is_selected {
                item.style(Style::default().bg(palette.selection_bg))
            } else {
                item
            }
        })
        .collect();

    StatefulWidget::render(
        List::new(items),
        area,
        frame.buffer_mut(),
        &mut app.list_state,
    );
}

fn render_results_count(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let search = &app.session.search;
    if search.query().is_empty() || search.is_loading() || search.results().is_empty() {
        return;
    }

    let count = search.results().len();
    let mut spans = vec![Span::styled(
        format!(
            "  {} result{}",
            count,
            if count == 1 { "" } else { "s" }
        ),
        Style::default().fg(palette.text),
    )];
    if let Some(duration) = search.last_duration() {
        spans.push(Span::styled(
            format!(" ({})", format_duration(duration)),
            Style::default().fg(palette.dim),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let dim = Style::default().fg(palette.dim);
    let bracket = Style::default().fg(palette.dim);

    let hints: &[&str] = if app.session.rating.is_open() {
        &[
            "↑↓ axis",
            "←→ score",
            "1-5 set",
            "Enter submit",
            "Esc cancel",
        ]
    } else if app.search_input.text.is_empty() {
        &["↑↓ select", "Enter search", "^t theme", "Esc quit"]
    } else {
        &["↑↓ select", "Enter rate", "^t theme", "Esc clear"]
    };

    let mut spans = vec![Span::styled(" ", dim)];
    for hint in hints {
        spans.push(Span::styled(" [", bracket));
        spans.push(Span::styled(*hint, dim));
        spans.push(Span::styled("]", bracket));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_toast_line(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    if let Some(ref toast) = app.toast {
        let bracket = Style::default().fg(palette.dim);
        let spans = vec![
            Span::styled("  [", bracket),
            Span::styled(&toast.message, Style::default().fg(palette.accent_alt)),
            Span::styled("]", bracket),
        ];
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_rating_dialog(frame: &mut Frame, form: &RatingForm, palette: &Palette) {
    let area = frame.area();
    let width = 48.min(area.width.saturating_sub(2));
    let height = 11.min(area.height.saturating_sub(2));
    let dialog_area = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 3,
        width,
        height,
    );

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(palette.accent))
        .style(Style::default().bg(palette.bg))
        .title(" Rate Faculty ");
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let dim = Style::default().fg(palette.dim);
    let editing = form.phase == RatingPhase::Editing;
    let inner_width = inner.width as usize;

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}", truncate_to_width(&form.faculty.name, inner_width.saturating_sub(2))),
            Style::default()
                .fg(palette.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    let label_width = RatingAxis::ALL
        .iter()
        .map(|a| a.label().width())
        .max()
        .unwrap_or(0);

    for axis in RatingAxis::ALL {
        let is_selected = editing && axis == form.axis;
        let score = form.scores.get(axis);
        let (marker, label_style) = if is_selected {
            (
                "▸ ",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(palette.text))
        };

        lines.push(Line::from(vec![
            Span::styled(format!(" {}", marker), label_style),
            Span::styled(
                format!("{:<width$}  ", axis.label(), width = label_width),
                label_style,
            ),
            Span::styled(score_bar(score), Style::default().fg(palette.accent_alt)),
            Span::styled(format!("  {}", score), label_style),
        ]));
    }

    lines.push(Line::default());
    let footer = if editing {
        Line::from(vec![
            Span::styled(" [", dim),
            Span::styled(
                "Enter",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Submit Review] [Esc cancel]", dim),
        ])
    } else {
        Line::from(Span::styled(
            " Submitting...",
            Style::default().fg(palette.accent_alt),
        ))
    };
    lines.push(footer);

    frame.render_widget(Paragraph::new(lines), inner);
}

fn score_bar(score: Score) -> String {
    (Score::MIN..=Score::MAX)
        .map(|n| if n <= score.get() { '●' } else { '○' })
        .collect()
}

fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn spinner_frame(started_at: Instant) -> &'static str {
    const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let elapsed = started_at.elapsed().as_millis() / 80;
    FRAMES[(elapsed as usize) % FRAMES.len()]
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}µs", micros)
    } else {
        format!("{:.1}ms", micros as f64 / 1000.0)
    }
}
