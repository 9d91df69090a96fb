// Presentation and clipboard seams

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::format::Document;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// Where conversation output goes.
pub trait Surface {
    /// Replace the content of the current assistant message.
    fn show_document(&mut self, document: &Document);

    fn append_message(&mut self, role: Role, text: &str);

    /// Show the transient "in progress" message.
    fn show_placeholder(&mut self);

    /// Remove the transient message. No-op when none is shown.
    fn remove_placeholder(&mut self);
}

/// A recorded surface operation, for surfaces living on another task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceUpdate {
    Document(Document),
    Message(Role, String),
    ShowPlaceholder,
    RemovePlaceholder,
}

impl SurfaceUpdate {
    pub fn apply<S: Surface + ?Sized>(self, surface: &mut S) {
        match self {
            Self::Document(document) => surface.show_document(&document),
            Self::Message(role, text) => surface.append_message(role, &text),
            Self::ShowPlaceholder => surface.show_placeholder(),
            Self::RemovePlaceholder => surface.remove_placeholder(),
        }
    }
}

/// Collects updates in order. Used by headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub updates: Vec<SurfaceUpdate>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_document(&self) -> Option<&Document> {
        self.updates.iter().rev().find_map(|update| match update {
            SurfaceUpdate::Document(document) => Some(document),
            _ => None,
        })
    }

    pub fn messages(&self, role: Role) -> Vec<&str> {
        self.updates
            .iter()
            .filter_map(|update| match update {
                SurfaceUpdate::Message(r, text) if *r == role => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn show_document(&mut self, document: &Document) {
        self.updates.push(SurfaceUpdate::Document(document.clone()));
    }

    fn append_message(&mut self, role: Role, text: &str) {
        self.updates.push(SurfaceUpdate::Message(role, text.to_string()));
    }

    fn show_placeholder(&mut self) {
        self.updates.push(SurfaceUpdate::ShowPlaceholder);
    }

    fn remove_placeholder(&mut self) {
        self.updates.push(SurfaceUpdate::RemovePlaceholder);
    }
}

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

#[cfg_attr(test, mockall::automock)]
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

/// Best-effort copy. Failures are logged and reported as `false`.
pub fn copy_text(sink: &mut dyn ClipboardSink, text: &str) -> bool {
    match sink.write_text(text) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "failed to copy to clipboard");
            false
        }
    }
}
