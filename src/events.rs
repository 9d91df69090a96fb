// Event types for async communication

use tokio::sync::mpsc::UnboundedSender;

use crate::api::HealthReport;
use crate::error::ClientError;
use crate::format::Document;
use crate::surface::{Role, Surface, SurfaceUpdate};

#[derive(Debug)]
pub enum AppEvent {
    /// A surface operation issued by the exchange task
    Surface(SurfaceUpdate),
    /// The exchange reached its terminal outcome
    ExchangeFinished(Result<(), ClientError>),
    /// A health probe completed
    Health(HealthReport),
}

/// Forwards surface operations to the UI loop, preserving their order.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: UnboundedSender<AppEvent>,
}

impl ChannelSurface {
    pub const fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, update: SurfaceUpdate) {
        // The receiver only goes away when the UI is shutting down.
        let _ = self.tx.send(AppEvent::Surface(update));
    }
}

impl Surface for ChannelSurface {
    fn show_document(&mut self, document: &Document) {
        self.send(SurfaceUpdate::Document(document.clone()));
    }

    fn append_message(&mut self, role: Role, text: &str) {
        self.send(SurfaceUpdate::Message(role, text.to_string()));
    }

    fn show_placeholder(&mut self) {
        self.send(SurfaceUpdate::ShowPlaceholder);
    }

    fn remove_placeholder(&mut self) {
        self.send(SurfaceUpdate::RemovePlaceholder);
    }
}
