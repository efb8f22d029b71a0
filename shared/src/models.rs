//! Request and response bodies of the webhook.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a Copilot-style conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Chat request payload.
///
/// Accepts either `{"message": "..."}` or `{"messages": [{"role", "content"}]}`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Text to interpret: `message` if present, otherwise the latest user turn.
    pub fn text(&self) -> &str {
        if let Some(message) = &self.message {
            return message;
        }

        self.messages
            .iter()
            .rev()
            .find(|m| m.role.eq_ignore_ascii_case("user"))
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Chat response payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: String,
}

impl ChatResponse {
    pub fn new(response: String) -> Self {
        Self {
            response,
            timestamp: now_iso8601(),
        }
    }
}

/// Health check payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now_iso8601(),
        }
    }
}

/// Error payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Current UTC time, RFC 3339 with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
