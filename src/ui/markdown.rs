// Terminal styling for rendered test case markup
//
// Built from the same markup the HTML view shows, so both views carry the
// same characters and differ only in how styles are drawn.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use casecards::render::{markup_lines, StyledRun};

/// Convert markup produced by `render` into styled lines, one per `<br>`.
pub fn markup_to_lines(markup: &str) -> Vec<Line<'static>> {
    markup_lines(markup)
        .into_iter()
        .map(|runs| Line::from(runs.into_iter().map(run_span).collect::<Vec<_>>()))
        .collect()
}

fn run_span(run: StyledRun) -> Span<'static> {
    let style = run_style(&run);
    Span::styled(run.text, style)
}

fn run_style(run: &StyledRun) -> Style {
    let mut style = Style::default();
    if run.list_number {
        style = style.fg(Color::Cyan);
    }
    if run.strong {
        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
    }
    if run.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    style
}
