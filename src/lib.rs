pub mod api;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod format;
pub mod logging;
pub mod models;
pub mod render;
pub mod segment;
pub mod stream;
pub mod surface;

pub use conversation::{ConversationController, ConversationState, ExchangeOutcome, SendError};
pub use error::ClientError;
pub use format::{format, Document, RecordMarkup};
pub use render::render;
pub use segment::{segment, Segments};
pub use stream::{StreamConsumer, StreamEvent};
