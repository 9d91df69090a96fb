use std::time::{Duration, Instant};

use casecards::api::HealthReport;
use casecards::conversation::ConversationController;
use casecards::format::Document;
use casecards::models::Message;
use casecards::surface::{copy_text, ClipboardSink, Role, Surface, SystemClipboard};

/// How long a card shows "Copied!" after a successful copy.
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

pub const EXAMPLE_PROMPTS: &[&str] = &[
    "User login with email and password, locked after 5 failed attempts",
    "Shopping cart: add, remove and update item quantities",
    "Password reset via emailed link that expires after 24 hours",
];

/// The transcript as shown on screen.
#[derive(Debug, Default)]
pub struct ChatView {
    pub messages: Vec<Message>,
    pub placeholder: bool,
    pub scroll_offset: usize,
}

impl ChatView {
    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub const fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // Clamped to the real maximum while rendering
        self.scroll_offset = usize::MAX;
    }

    /// The newest assistant message that has cards.
    pub fn latest_cards(&self) -> Option<&Document> {
        self.messages
            .iter()
            .rev()
            .filter_map(|m| m.document.as_ref())
            .find(|d| d.is_carded())
    }
}

impl Surface for ChatView {
    fn show_document(&mut self, document: &Document) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::Assistant {
                last.set_document(document.clone());
            }
        }
        self.scroll_to_bottom();
    }

    fn append_message(&mut self, role: Role, text: &str) {
        self.messages.push(Message::new(role, text.to_string()));
        self.scroll_to_bottom();
    }

    fn show_placeholder(&mut self) {
        self.placeholder = true;
        self.scroll_to_bottom();
    }

    fn remove_placeholder(&mut self) {
        self.placeholder = false;
    }
}

pub struct App {
    pub should_quit: bool,
    pub exit_pending: bool,
    pub show_help: bool,
    pub view: ChatView,
    pub controller: ConversationController,
    pub input_buffer: String,
    /// Why the last send was refused, shown until the next keystroke.
    pub notice: Option<String>,
    pub health: Option<HealthReport>,
    pub selected_card: Option<usize>,
    pub copied: Option<(usize, Instant)>,
    next_example: usize,
    clipboard: Box<dyn ClipboardSink>,
}

impl App {
    pub fn new(max_input_chars: usize) -> Self {
        Self::with_clipboard(max_input_chars, Box::new(SystemClipboard))
    }

    pub fn with_clipboard(max_input_chars: usize, clipboard: Box<dyn ClipboardSink>) -> Self {
        Self {
            should_quit: false,
            exit_pending: false,
            show_help: false,
            view: ChatView::default(),
            controller: ConversationController::new(max_input_chars),
            input_buffer: String::new(),
            notice: None,
            health: None,
            selected_card: None,
            copied: None,
            next_example: 0,
            clipboard,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn input_char_count(&self) -> usize {
        self.input_buffer.chars().count()
    }

    /// Whether Enter would currently be accepted.
    pub fn can_send(&self) -> bool {
        !self.controller.is_generating() && !self.input_buffer.trim().is_empty()
    }

    /// Replace the input with the next example prompt.
    pub fn load_next_example(&mut self) {
        self.input_buffer = EXAMPLE_PROMPTS[self.next_example % EXAMPLE_PROMPTS.len()].to_string();
        self.next_example += 1;
        self.notice = None;
    }

    fn card_count(&self) -> usize {
        self.view.latest_cards().map_or(0, |d| d.records.len())
    }

    pub fn select_next_card(&mut self) {
        let count = self.card_count();
        if count == 0 {
            self.selected_card = None;
            return;
        }
        self.selected_card = Some(match self.selected_card {
            Some(i) if i + 1 < count => i + 1,
            Some(_) => count - 1,
            None => 0,
        });
    }

    pub fn select_previous_card(&mut self) {
        let count = self.card_count();
        if count == 0 {
            self.selected_card = None;
            return;
        }
        self.selected_card = Some(match self.selected_card {
            Some(i) => i.saturating_sub(1).min(count - 1),
            None => count - 1,
        });
    }

    /// Copy the selected card. The "Copied!" state only changes on success.
    pub fn copy_selected_card(&mut self) -> bool {
        let Some(index) = self.selected_card else {
            return false;
        };
        let Some(source) = self
            .view
            .latest_cards()
            .and_then(|d| d.records.get(index))
            .map(|r| r.copy_source.clone())
        else {
            return false;
        };

        let copied = copy_text(self.clipboard.as_mut(), &source);
        if copied {
            self.copied = Some((index, Instant::now()));
        }
        copied
    }

    pub fn is_copied(&self, index: usize) -> bool {
        self.copied
            .is_some_and(|(i, at)| i == index && at.elapsed() < COPIED_FEEDBACK)
    }
}
