use serde::{Deserialize, Serialize};

use crate::format::Document;
use crate::surface::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Structured view of assistant content, rebuilt on every update.
    pub document: Option<Document>,
}

impl Message {
    pub fn new(role: Role, content: String) -> Self {
        let document = match role {
            Role::Assistant => Some(Document::from_text(&content)),
            Role::User | Role::Error => None,
        };
        Self {
            role,
            content,
            document,
        }
    }

    pub fn set_document(&mut self, document: Document) {
        self.document = Some(document);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub max_input_chars: usize,
    pub health_interval_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            max_input_chars: 5000,
            health_interval_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::new(Role::User, "Hello".to_string());
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.document.is_none());
    }

    #[test]
    fn test_assistant_message_has_document() {
        let msg = Message::new(Role::Assistant, String::new());
        assert_eq!(msg.document, Some(Document::default()));
    }

    #[test]
    fn test_set_document_replaces_view() {
        let mut msg = Message::new(Role::Assistant, String::new());
        msg.set_document(Document::from_text("s\n---\na\n---\nb"));
        assert_eq!(msg.document.map(|d| d.records.len()), Some(2));
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.max_input_chars, 5000);
        assert_eq!(config.health_interval_secs, 30);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("server_url = \"http://gen:8000\"").unwrap();
        assert_eq!(config.server_url, "http://gen:8000");
        assert_eq!(config.max_input_chars, 5000);
    }
}
