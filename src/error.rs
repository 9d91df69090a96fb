// Error taxonomy for talking to the generator service

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection failed or dropped, before or during streaming.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The stream itself reported a failure.
    #[error("generation failed: {0}")]
    Stream(String),

    #[error("failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ClientError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } | Self::Stream(message) => message.clone(),
            Self::Network(err) => format!("Cannot reach server ({err})"),
            Self::ClientBuild(err) => err.to_string(),
        }
    }

    /// Transport errors happen outside the event stream; stream failures inside it.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Network(_) | Self::ClientBuild(_))
    }
}
