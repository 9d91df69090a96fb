// Event stream consumption: framing, classification, buffering

use futures::stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::format::Document;
use crate::surface::Surface;

/// Prefix of every event line.
pub const EVENT_PREFIX: &str = "data: ";
/// Payload marking the normal end of a stream.
pub const COMPLETION_TOKEN: &str = "[DONE]";
/// Payload prefix marking a server-side failure.
pub const FAILURE_PREFIX: &str = "[ERROR]";

/// One classified event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    Completion,
    Failure(String),
}

impl StreamEvent {
    /// Classify an event line. Lines without [`EVENT_PREFIX`] carry no event.
    pub fn parse_line(line: &str) -> Option<Self> {
        let payload = line.strip_prefix(EVENT_PREFIX)?;
        Some(Self::classify(payload))
    }

    pub fn classify(payload: &str) -> Self {
        if payload == COMPLETION_TOKEN {
            return Self::Completion;
        }
        match payload.strip_prefix(FAILURE_PREFIX) {
            Some(message) => Self::Failure(message.strip_prefix(' ').unwrap_or(message).to_string()),
            None => Self::Fragment(payload.to_string()),
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion | Self::Failure(_))
    }
}

/// Splits a byte stream into lines, carrying partial lines across chunks.
///
/// Bytes are only decoded once a full line is available, so multi-byte
/// characters split between chunks decode intact.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.pending, rest);
            line.pop();
            lines.push(decode_line(&line));
        }
        lines
    }

    /// Return the unterminated tail left at end of stream, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(decode_line(&line))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_suffix('\r').unwrap_or(&text).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerState {
    Idle,
    Streaming,
    Completed,
    Failed(String),
}

impl ConsumerState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Owns the raw buffer of one generation and drives its read loop.
#[derive(Debug)]
pub struct StreamConsumer {
    buffer: String,
    state: ConsumerState,
    decoder: FrameDecoder,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            state: ConsumerState::Idle,
            decoder: FrameDecoder::new(),
        }
    }

    pub const fn state(&self) -> &ConsumerState {
        &self.state
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Process one transport chunk.
    ///
    /// Every fragment appends to the buffer and pushes a document rebuilt from
    /// the whole buffer to `surface` before the next line is looked at.
    pub fn push_chunk<S: Surface + ?Sized>(&mut self, chunk: &[u8], surface: &mut S) {
        if self.state == ConsumerState::Idle {
            self.state = ConsumerState::Streaming;
        }
        for line in self.decoder.push(chunk) {
            self.handle_line(&line, surface);
        }
    }

    /// Flush any unterminated last line and settle the final state.
    ///
    /// A stream that ends without a terminal event counts as completed.
    pub fn end_of_stream<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(line) = self.decoder.finish() {
            self.handle_line(&line, surface);
        }
        if !self.state.is_terminal() {
            self.state = ConsumerState::Completed;
        }
    }

    fn handle_line<S: Surface + ?Sized>(&mut self, line: &str, surface: &mut S) {
        let Some(event) = StreamEvent::parse_line(line) else {
            return;
        };

        if self.state.is_terminal() {
            debug!(?event, "ignoring event after end of stream");
            return;
        }

        match event {
            StreamEvent::Fragment(text) => {
                debug!(len = text.len(), "fragment");
                self.buffer.push_str(&text);
                surface.show_document(&Document::from_text(&self.buffer));
            }
            StreamEvent::Completion => self.state = ConsumerState::Completed,
            StreamEvent::Failure(message) => self.state = ConsumerState::Failed(message),
        }
    }

    /// Read `source` until a terminal event or end of stream.
    ///
    /// A read error fails the stream with a network error. The partially
    /// rendered document is never rolled back.
    pub async fn consume<St, B, S>(&mut self, source: St, surface: &mut S) -> Result<(), ClientError>
    where
        St: Stream<Item = Result<B, ClientError>>,
        B: AsRef<[u8]>,
        S: Surface + ?Sized,
    {
        futures::pin_mut!(source);

        while !self.state.is_terminal() {
            match source.next().await {
                Some(Ok(chunk)) => self.push_chunk(chunk.as_ref(), surface),
                Some(Err(err)) => {
                    warn!(error = %err, "stream interrupted");
                    self.state = ConsumerState::Failed(err.user_message());
                    return Err(err);
                }
                None => self.end_of_stream(surface),
            }
        }

        match &self.state {
            ConsumerState::Failed(message) => {
                warn!(%message, "generation failed");
                Err(ClientError::Stream(message.clone()))
            }
            _ => {
                info!(
                    len = self.buffer.len(),
                    records = Document::from_text(&self.buffer).records.len(),
                    "stream completed"
                );
                Ok(())
            }
        }
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}
