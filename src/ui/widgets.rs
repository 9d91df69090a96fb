use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use casecards::api::HealthState;
use casecards::format::Document;
use casecards::surface::Role;

use super::markdown::markup_to_lines;
use crate::app::{App, EXAMPLE_PROMPTS};

const CARD_RULE: &str = "────────────────────────────────────────────";

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "casecards - Keyboard Shortcuts",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("General:"),
        Line::from("  Ctrl+H          - Show/hide this help"),
        Line::from("  Ctrl+Q          - Quit application"),
        Line::from("  Ctrl+C (twice)  - Quit application"),
        Line::from(""),
        section("Input:"),
        Line::from("  Enter           - Generate test cases"),
        Line::from("  Alt+Enter       - New line"),
        Line::from("  Ctrl+E          - Load an example requirement"),
        Line::from(""),
        section("Cards:"),
        Line::from("  Ctrl+Up/Down    - Select a test case card"),
        Line::from("  Ctrl+Y          - Copy the selected card"),
        Line::from(""),
        section("Navigation:"),
        Line::from("  Up/Down         - Scroll history"),
        Line::from("  PgUp/PgDn       - Scroll history"),
        Line::from("  Home/End        - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 56;
    let popup_height = 24;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel".to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if let Some(notice) = &app.notice {
        (notice.clone(), Style::default().fg(Color::Yellow))
    } else {
        (
            "Ctrl+C: Quit | Ctrl+H: Help | Ctrl+E: Example | Ctrl+Y: Copy card".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

/// Status indicator colour for the last health probe.
pub const fn health_color(state: Option<HealthState>) -> Color {
    match state {
        Some(HealthState::Connected) => Color::Green,
        Some(HealthState::ModelUnavailable) => Color::Yellow,
        Some(HealthState::Disconnected) => Color::Red,
        None => Color::DarkGray,
    }
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (label, detail) = app
        .health
        .as_ref()
        .map_or(("Checking...", ""), |h| (h.label(), h.detail.as_str()));
    let color = health_color(app.health.as_ref().map(|h| h.state));

    let mut spans = vec![
        Span::styled("● ", Style::default().fg(color)),
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ];
    if !detail.is_empty() {
        spans.push(Span::styled(
            format!(" ({detail})"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if app.controller.is_generating() {
        spans.push(Span::styled(
            " [Generating...]",
            Style::default().fg(Color::Magenta),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(status, area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let mut welcome_text = vec![
        Line::from(Span::styled(
            "Test Case Generator",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Describe a feature or user story and get structured test cases",
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Try an example (Ctrl+E):",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    welcome_text.extend(EXAMPLE_PROMPTS.iter().map(|example| {
        Line::from(Span::styled(
            format!("  {example}"),
            Style::default().fg(Color::Gray),
        ))
    }));

    #[allow(clippy::cast_possible_truncation)]
    let welcome_height = welcome_text.len() as u16;
    let welcome_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(welcome_height),
        width: area.width,
        height: welcome_height.min(area.height),
    };

    frame.render_widget(
        Paragraph::new(welcome_text).alignment(Alignment::Center),
        welcome_area,
    );
}

/// Lines for one assistant document: summary, then one framed block per card.
pub fn document_lines(
    document: &Document,
    selected: Option<usize>,
    is_copied: impl Fn(usize) -> bool,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if document.is_empty() {
        lines.push(Line::from(Span::styled("...", Style::default().fg(Color::DarkGray))));
        return lines;
    }

    if !document.summary.is_empty() {
        lines.extend(markup_to_lines(&document.summary_markup));
    }

    for (index, record) in document.records.iter().enumerate() {
        let is_selected = selected == Some(index);
        let border = if is_selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let copy_label = if is_copied(index) {
            Span::styled(" ✓ Copied! ", Style::default().fg(Color::Green))
        } else {
            Span::styled(" Copy ", border)
        };

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format!("┌─ Card {} ", index + 1), border),
            copy_label,
            Span::styled("─".repeat(12), border),
        ]));
        for body_line in markup_to_lines(&record.body) {
            let mut spans = vec![Span::styled("│ ", border)];
            spans.extend(body_line.spans);
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(Span::styled(format!("└{CARD_RULE}"), border)));
    }

    lines
}

pub fn render_chat_history(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.view.messages.is_empty() && !app.view.placeholder {
        render_welcome(frame, area);
        return;
    }

    let latest_cards = app.view.latest_cards().cloned();
    let mut lines = Vec::new();

    for message in &app.view.messages {
        let (role, color) = match message.role {
            Role::User => ("You", Color::Cyan),
            Role::Assistant => ("Generator", Color::Green),
            Role::Error => ("Error", Color::Red),
        };

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("## {role}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        match (&message.role, &message.document) {
            (Role::Assistant, Some(document)) => {
                // Only the newest carded document takes part in selection
                let selectable = latest_cards.as_ref() == Some(document);
                let selected = app.selected_card.filter(|_| selectable);
                lines.extend(document_lines(document, selected, |i| {
                    selectable && app.is_copied(i)
                }));
            }
            (Role::Error, _) => {
                lines.extend(message.content.lines().map(|line| {
                    Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Red)))
                }));
            }
            _ => {
                lines.extend(
                    message
                        .content
                        .lines()
                        .map(|line| Line::from(line.to_string())),
                );
            }
        }
    }

    if app.view.placeholder {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Generator is thinking...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Account for wrapping to find the true visual height
    let available_width = (area.width as usize).max(1);
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let visible_height = area.height as usize;
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = app.view.scroll_offset.min(max_scroll);
    app.view.scroll_offset = actual_scroll;

    let chat_history = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(chat_history, area);
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let (input_text, input_style) = if app.input_buffer.is_empty() {
        (
            "Describe a feature to generate test cases...",
            Style::default().fg(Color::Gray),
        )
    } else {
        (
            app.input_buffer.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };

    let count = app.input_char_count();
    let max = app.controller.max_input_chars();
    let counter_style = if count > max {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_color = if app.can_send() { Color::Cyan } else { Color::DarkGray };

    let input = Paragraph::new(input_text)
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title_bottom(
                    Line::from(Span::styled(format!(" {count} / {max} "), counter_style))
                        .right_aligned(),
                ),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}
