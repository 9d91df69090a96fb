pub mod markdown;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    // Text width inside the input borders
    let available_width = (frame.area().width.saturating_sub(2) as usize).max(1);

    let input_lines: usize = if app.input_buffer.is_empty() {
        1
    } else {
        app.input_buffer
            .split('\n')
            .map(|line| line.chars().count().div_ceil(available_width).max(1))
            .sum()
    };

    // At most half the screen
    let max_lines = (frame.area().height as usize / 2).saturating_sub(2).max(1);
    let actual_lines = input_lines.clamp(1, max_lines);

    #[allow(clippy::cast_possible_truncation)]
    let input_height = (actual_lines + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),               // Chat history
            Constraint::Length(1),            // Gap
            Constraint::Length(1),            // Health and generation status
            Constraint::Length(input_height), // Input field
            Constraint::Length(1),            // Keymap bar
        ])
        .split(frame.area());

    widgets::render_chat_history(frame, app, chunks[0]);
    widgets::render_status_bar(frame, app, chunks[2]);
    widgets::render_input_field(frame, app, chunks[3]);
    widgets::render_bottom_bar(frame, app, chunks[4]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
