// Generator service client

use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ClientError;

pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ClientError>>;

#[derive(Debug, Clone)]
pub struct GeneratorClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub user_input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Body of the health endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub healthy: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Connected,
    ModelUnavailable,
    Disconnected,
}

/// Result of one health probe, ready for the status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub state: HealthState,
    pub detail: String,
}

impl HealthReport {
    pub fn from_response(response: &HealthResponse) -> Self {
        let state = if response.healthy {
            HealthState::Connected
        } else {
            HealthState::ModelUnavailable
        };
        Self {
            state,
            detail: response.message.clone(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            state: HealthState::Disconnected,
            detail: "Cannot reach server".to_string(),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self.state {
            HealthState::Connected => "Connected",
            HealthState::ModelUnavailable => "Model unavailable",
            HealthState::Disconnected => "Disconnected",
        }
    }
}

impl GeneratorClient {
    pub fn new(base_url: &str, connect_timeout: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .build()
            .map_err(ClientError::ClientBuild)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a streaming generation and return the raw body chunks.
    ///
    /// Resolves once response headers arrive. A non-success status is turned
    /// into [`ClientError::Status`] using the `error` field of the JSON body.
    pub async fn generate_stream(&self, user_input: &str) -> Result<ByteStream, ClientError> {
        let url = format!("{}/api/generate/stream", self.base_url);
        info!(len = user_input.chars().count(), "sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { user_input })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status,
                message: error_message(&text),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ClientError::from));

        Ok(stream.boxed())
    }

    /// Probe the service. Never fails: unreachable means disconnected.
    pub async fn health_check(&self) -> HealthReport {
        let url = format!("{}/api/health", self.base_url);

        let report = match self.client.get(&url).send().await {
            Ok(response) => match response.json::<HealthResponse>().await {
                Ok(body) => HealthReport::from_response(&body),
                Err(_) => HealthReport::unreachable(),
            },
            Err(_) => HealthReport::unreachable(),
        };

        debug!(state = report.label(), detail = %report.detail, "health probe");
        report
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| "Server error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeneratorClient::new("http://localhost:5000/", 10);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_generate_request_serialization() {
        let json = serde_json::to_string(&GenerateRequest { user_input: "Login page" }).unwrap();
        assert_eq!(json, r#"{"user_input":"Login page"}"#);
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message(r#"{"success":false,"error":"Input cannot be empty"}"#),
            "Input cannot be empty"
        );
        assert_eq!(error_message(r#"{"success":false}"#), "Server error");
        assert_eq!(error_message("<html>502</html>"), "Server error");
    }

    #[test]
    fn test_health_response_deserialization() {
        let json = r#"{"healthy":true,"message":"Model 'llama3.2' is ready","models":["llama3.2:latest"]}"#;
        let response: HealthResponse = serde_json::from_str(json).unwrap();
        let report = HealthReport::from_response(&response);
        assert_eq!(report.state, HealthState::Connected);
        assert_eq!(report.label(), "Connected");
        assert_eq!(report.detail, "Model 'llama3.2' is ready");
    }

    #[test]
    fn test_health_labels() {
        let down = HealthResponse {
            healthy: false,
            message: "Model 'x' not found".to_string(),
            models: Vec::new(),
        };
        assert_eq!(HealthReport::from_response(&down).label(), "Model unavailable");
        assert_eq!(HealthReport::unreachable().label(), "Disconnected");
        assert_eq!(HealthReport::unreachable().detail, "Cannot reach server");
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = GeneratorClient::new("http://127.0.0.1:9", 1).unwrap();
        let report = client.health_check().await;
        assert_eq!(report.state, HealthState::Disconnected);
    }
}
