// One request/response exchange and the single-slot generating state

use thiserror::Error;
use tracing::{info, warn};

use crate::api::GeneratorClient;
use crate::error::ClientError;
use crate::stream::StreamConsumer;
use crate::surface::{Role, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    Generating,
}

/// Reasons a send is refused before anything is sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("a response is still being generated")]
    Busy,
    #[error("input cannot be empty")]
    Empty,
    #[error("input too long ({len} chars), maximum is {max} characters")]
    TooLong { len: usize, max: usize },
}

/// How an admitted exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Completed,
    /// Carries the message shown to the user.
    Failed(String),
}

/// Admission and terminal reporting for exchanges.
///
/// At most one exchange is in flight: [`submit`](Self::submit) refuses while
/// generating, and only [`finish`](Self::finish) returns to idle.
#[derive(Debug)]
pub struct ConversationController {
    state: ConversationState,
    max_input_chars: usize,
}

impl ConversationController {
    pub const fn new(max_input_chars: usize) -> Self {
        Self {
            state: ConversationState::Idle,
            max_input_chars,
        }
    }

    pub const fn state(&self) -> ConversationState {
        self.state
    }

    pub const fn is_generating(&self) -> bool {
        matches!(self.state, ConversationState::Generating)
    }

    pub const fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Check `input` without changing anything. Returns the trimmed prompt.
    pub fn validate<'a>(&self, input: &'a str) -> Result<&'a str, SendError> {
        if self.is_generating() {
            return Err(SendError::Busy);
        }
        let prompt = input.trim();
        if prompt.is_empty() {
            return Err(SendError::Empty);
        }
        let len = prompt.chars().count();
        if len > self.max_input_chars {
            return Err(SendError::TooLong {
                len,
                max: self.max_input_chars,
            });
        }
        Ok(prompt)
    }

    /// Admit a send: echo the user message, show the placeholder, start generating.
    pub fn submit<S: Surface + ?Sized>(
        &mut self,
        input: &str,
        surface: &mut S,
    ) -> Result<String, SendError> {
        let prompt = self.validate(input)?.to_string();
        surface.append_message(Role::User, &prompt);
        surface.show_placeholder();
        self.state = ConversationState::Generating;
        Ok(prompt)
    }

    /// Report the terminal outcome and return to idle.
    pub fn finish<S: Surface + ?Sized>(
        &mut self,
        outcome: Result<(), ClientError>,
        surface: &mut S,
    ) -> ExchangeOutcome {
        self.state = ConversationState::Idle;
        match outcome {
            Ok(()) => ExchangeOutcome::Completed,
            Err(err) => {
                warn!(error = %err, transport = err.is_transport(), "exchange failed");
                let message = err.user_message();
                surface.remove_placeholder();
                surface.append_message(Role::Error, &format!("Error: {message}"));
                ExchangeOutcome::Failed(message)
            }
        }
    }

    /// Run a whole exchange on one surface.
    pub async fn run<S: Surface + ?Sized>(
        &mut self,
        client: &GeneratorClient,
        input: &str,
        surface: &mut S,
    ) -> Result<ExchangeOutcome, SendError> {
        let prompt = self.submit(input, surface)?;
        let outcome = exchange(client, &prompt, surface).await;
        Ok(self.finish(outcome, surface))
    }
}

/// Open the stream and consume it to its terminal event.
///
/// The placeholder stays up until response headers arrive; on a transport
/// failure it is left for [`ConversationController::finish`] to remove.
pub async fn exchange<S: Surface + ?Sized>(
    client: &GeneratorClient,
    prompt: &str,
    surface: &mut S,
) -> Result<(), ClientError> {
    let source = client.generate_stream(prompt).await?;

    surface.remove_placeholder();
    surface.append_message(Role::Assistant, "");

    let mut consumer = StreamConsumer::new();
    let outcome = consumer.consume(source, surface).await;
    if outcome.is_ok() {
        info!(len = consumer.buffer().len(), "exchange complete");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceUpdate};

    #[test]
    fn test_submit_moves_to_generating() {
        let mut controller = ConversationController::new(5000);
        let mut surface = RecordingSurface::new();

        let prompt = controller.submit("  Login page  ", &mut surface).unwrap();
        assert_eq!(prompt, "Login page");
        assert!(controller.is_generating());
        assert_eq!(
            surface.updates,
            vec![
                SurfaceUpdate::Message(Role::User, "Login page".to_string()),
                SurfaceUpdate::ShowPlaceholder,
            ]
        );
    }

    #[test]
    fn test_send_while_generating_is_rejected_without_side_effects() {
        let mut controller = ConversationController::new(5000);
        let mut surface = RecordingSurface::new();
        controller.submit("first", &mut surface).unwrap();
        let before = surface.updates.len();

        assert_eq!(controller.submit("second", &mut surface), Err(SendError::Busy));
        assert_eq!(controller.state(), ConversationState::Generating);
        assert_eq!(surface.updates.len(), before);
    }

    #[test]
    fn test_empty_and_long_inputs_are_rejected() {
        let mut controller = ConversationController::new(10);
        let mut surface = RecordingSurface::new();

        assert_eq!(controller.submit("   \n", &mut surface), Err(SendError::Empty));
        assert_eq!(
            controller.submit("ééééééééééé", &mut surface),
            Err(SendError::TooLong { len: 11, max: 10 })
        );
        assert_eq!(controller.validate("éééééééééé"), Ok("éééééééééé"));
        assert_eq!(controller.state(), ConversationState::Idle);
        assert!(surface.updates.is_empty());
    }

    #[test]
    fn test_finish_with_failure_reports_and_goes_idle() {
        let mut controller = ConversationController::new(5000);
        let mut surface = RecordingSurface::new();
        controller.submit("x", &mut surface).unwrap();

        let outcome =
            controller.finish(Err(ClientError::Stream("backend down".to_string())), &mut surface);
        assert_eq!(outcome, ExchangeOutcome::Failed("backend down".to_string()));
        assert_eq!(controller.state(), ConversationState::Idle);
        assert_eq!(surface.messages(Role::Error), vec!["Error: backend down"]);
        assert_eq!(surface.updates.last(), Some(&SurfaceUpdate::Message(
            Role::Error,
            "Error: backend down".to_string()
        )));
    }

    #[test]
    fn test_finish_with_success_is_silent() {
        let mut controller = ConversationController::new(5000);
        let mut surface = RecordingSurface::new();
        controller.submit("x", &mut surface).unwrap();
        let before = surface.updates.len();

        assert_eq!(controller.finish(Ok(()), &mut surface), ExchangeOutcome::Completed);
        assert_eq!(controller.state(), ConversationState::Idle);
        assert_eq!(surface.updates.len(), before);
    }

    #[test]
    fn test_send_error_messages() {
        assert_eq!(
            SendError::TooLong { len: 6000, max: 5000 }.to_string(),
            "input too long (6000 chars), maximum is 5000 characters"
        );
    }
}
