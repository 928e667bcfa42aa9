//! TUI rendering module.
//!
//! This module handles all visual rendering using ratatui:
//! - Input form: format toggle, text box, file field
//! - Results overlay: loading indicator, record accordion, failure panel
//! - File browser and validation notice popups
//! - Status bar with messages and key hints
//!
//! Rendering only reads `AppState`; whatever the store holds is what the
//! widgets show.

pub mod glyphs;

use std::ops::Range;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::browser::FileBrowser;
use crate::lifecycle::RequestState;
use crate::model::{AppState, Focus, SequenceFormat, UiMode};
use crate::presentation::{self, PanelCursor};
use crate::results::ResultCollection;
use glyphs::Glyphs;

/// Height of the status bar.
const STATUS_BAR_HEIGHT: u16 = 1;
/// Height of single-line bordered widgets.
const FIELD_HEIGHT: u16 = 3;
/// Minimum height of the text box.
const MIN_TEXT_HEIGHT: u16 = 5;

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn placeholder(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

/// Renders the complete UI.
pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Min(MIN_TEXT_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);

    let title = Line::from(Span::styled(
        " Sequence Analyser",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(title), layout[0]);
    render_format_toggle(frame, state, layout[1]);
    render_text_input(frame, state, layout[2]);
    render_file_input(frame, state, layout[3]);
    render_status_bar(frame, state, layout[4]);

    // Popups, bottom to top
    if state.request.is_overlay_visible() {
        render_results_overlay(frame, state, area);
    }
    if let Some(browser) = &state.browser {
        render_browser(frame, state, browser, area);
    }
    if let Some(notice) = &state.notice {
        render_notice(frame, notice, area);
    }
}

/// Renders the FASTQ/FASTA toggle.
fn render_format_toggle(frame: &mut Frame, state: &AppState, area: Rect) {
    let current = state.format.current();
    let mut spans = vec![Span::raw(" Sequence type: ")];
    for format in [SequenceFormat::Fastq, SequenceFormat::Fasta] {
        let (mark, style) = if format == current {
            (
                "(*)",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("( )", Style::default().fg(Color::DarkGray))
        };
        spans.push(Span::styled(format!("{mark} {format}  "), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state.focus == Focus::Format))
        .title("Format");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Renders the pasted-text box, scrolled so the end of the text stays visible.
fn render_text_input(frame: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.focus == Focus::Text;
    let text = state.input.text();

    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = if text.is_empty() && !focused {
        vec![placeholder("Paste sequence records here")]
    } else {
        let mut content = text.to_string();
        if focused {
            content.push_str(state.glyphs.cursor);
        }
        // Only the tail is drawn; pastes can exceed any scroll offset
        let all: Vec<&str> = content.split('\n').collect();
        all[all.len().saturating_sub(inner_height)..]
            .iter()
            .map(|line| Line::from(line.to_string()))
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(format!("Input text ({})", state.format.current()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the selected file path.
fn render_file_input(frame: &mut Frame, state: &AppState, area: Rect) {
    let path = state.input.file_path();
    let line = if path.is_empty() {
        placeholder("Press Enter to browse for a sequence file")
    } else {
        Line::from(path.to_string())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state.focus == Focus::File))
        .title("Input file");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Renders the status bar at the bottom.
fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let (mode_str, hints) = match state.mode() {
        UiMode::Input(Focus::Format) => ("FORMAT", "Space toggle | Tab next | ^S submit | ^Q quit"),
        UiMode::Input(Focus::Text) => ("TEXT", "Tab next | ^T format | ^S submit | ^L clear | ^Q quit"),
        UiMode::Input(Focus::File) => ("FILE", "Enter browse | Bksp clear | ^S submit | ^Q quit"),
        UiMode::Notice => ("NOTICE", "any key to continue"),
        UiMode::Browser => ("BROWSE", "j/k move | Enter open | h parent | Esc cancel"),
        UiMode::Overlay => ("RESULTS", overlay_hints(&state.request)),
    };

    let message = state.status_message.as_deref().unwrap_or("");
    let left_content = format!(" {} | {} ", mode_str, message);
    let right_content = format!("{} ", hints);

    let left_len = left_content.chars().count();
    let right_len = right_content.chars().count();
    let status_line = Line::from(vec![
        Span::styled(
            left_content,
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::styled(
            " ".repeat((area.width as usize).saturating_sub(left_len + right_len)),
            Style::default().bg(Color::Cyan),
        ),
        Span::styled(
            right_content,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(status_line), area);
}

/// Renders the results overlay for the current request state.
fn render_results_overlay(frame: &mut Frame, state: &AppState, area: Rect) {
    let popup = centered_rect(80, 80, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Results ");
    let inner_width = popup.width.saturating_sub(2) as usize;
    let inner_height = popup.height.saturating_sub(2) as usize;

    let (lines, focus) = match &state.request {
        RequestState::Idle => return,
        RequestState::Awaiting { .. } => (
            vec![
                Line::default(),
                Line::from(format!(
                    "  {} Loading results...",
                    state.glyphs.spinner_frame(state.tick)
                )),
            ],
            0..0,
        ),
        RequestState::Loaded { results } => accordion_lines(results, &state.panels, &state.glyphs),
        RequestState::Failed { message } => (failure_lines(message, inner_width), 0..0),
    };

    let first = first_visible_line(&focus, inner_height);
    let visible: Vec<Line> = lines.into_iter().skip(first).collect();
    let footer = format!(" {} ", overlay_hints(&state.request));
    let paragraph = Paragraph::new(visible).block(block.title_bottom(footer));
    frame.render_widget(paragraph, popup);
}

/// Key hints for the overlay in its current state.
fn overlay_hints(request: &RequestState) -> &'static str {
    match request {
        RequestState::Loaded { .. } => "j/k move | Enter expand | s save | Esc close",
        RequestState::Failed { .. } => "r retry | Esc close",
        RequestState::Idle | RequestState::Awaiting { .. } => "Esc close",
    }
}

/// First line to draw so the selected panel fits, header first if it cannot.
fn first_visible_line(focus: &Range<usize>, height: usize) -> usize {
    focus.end.saturating_sub(height).min(focus.start)
}

/// Builds the accordion; returns the lines and the line range of the selected panel.
fn accordion_lines(
    results: &ResultCollection,
    cursor: &PanelCursor,
    glyphs: &Glyphs,
) -> (Vec<Line<'static>>, Range<usize>) {
    if results.is_empty() {
        return (
            vec![Line::default(), Line::from("  The backend returned no records.")],
            0..0,
        );
    }

    let mut lines = Vec::new();
    let mut focus = 0..0;
    for (index, panel) in presentation::panels(results).into_iter().enumerate() {
        let is_selected = index == cursor.selected();
        let is_expanded = cursor.is_expanded(index);
        let start = lines.len();

        let marker = if is_selected { glyphs.selected } else { " " };
        let icon = if is_expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        };
        let style = if is_selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{icon} {}", panel.title),
            style,
        )));

        if is_expanded {
            lines.extend(
                panel
                    .body_lines()
                    .into_iter()
                    .map(|line| Line::from(format!("    {line}"))),
            );
        }
        if is_selected {
            focus = start..lines.len();
        }
    }
    (lines, focus)
}

fn failure_lines(message: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "  Analysis failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(
        textwrap::wrap(message, width.saturating_sub(4).max(10))
            .into_iter()
            .map(|line| Line::from(format!("  {line}"))),
    );
    lines.push(Line::default());
    lines.push(Line::from("  Press r to retry or Esc to dismiss."));
    lines
}

/// Renders the file browser popup.
fn render_browser(frame: &mut Frame, state: &AppState, browser: &FileBrowser, area: Rect) {
    let popup = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = browser
        .entries()
        .iter()
        .map(|entry| {
            let prefix = if entry.is_dir {
                state.glyphs.dir_prefix
            } else {
                state.glyphs.file_prefix
            };
            ListItem::new(format!("{prefix}{}", entry.name))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", browser.dir().display()))
        .title_bottom(" .fq .fastq .fa .fasta (.gz) ");
    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut list_state = ListState::default().with_selected(Some(browser.selected()));
    frame.render_stateful_widget(list, popup, &mut list_state);
}

/// Renders a blocking validation notice.
fn render_notice(frame: &mut Frame, notice: &str, area: Rect) {
    let width = (area.width / 2).max(30).min(area.width);
    let wrapped = textwrap::wrap(notice, width.saturating_sub(4) as usize);

    let mut lines: Vec<Line> = wrapped
        .iter()
        .map(|line| Line::from(format!(" {line}")))
        .collect();
    lines.push(Line::default());
    lines.push(placeholder(" Press any key to continue"));

    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Notice ");
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Returns a rectangle centered in `area` taking the given percentages.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
