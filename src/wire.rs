//! Wire types exchanged with the backend chat endpoint.
//!
//! # Example
//!
//! ```rust
//! use chat_stream_form::wire::ChatRequest;
//!
//! let req = ChatRequest::new("You are terse.", "hi", "sk-test");
//! let json = serde_json::to_value(&req).unwrap();
//! assert_eq!(json["user_message"], "hi");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::GENERIC_BACKEND_ERROR;

/// Path of the chat endpoint, relative to the backend base URL.
pub const CHAT_PATH: &str = "/api/chat";

/// Request body for `POST /api/chat`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Developer (system) message steering the assistant.
    pub developer_message: String,
    /// The user's message.
    pub user_message: String,
    /// Key forwarded to the backend.
    pub api_key: String,
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("developer_message", &self.developer_message)
            .field("user_message", &self.user_message)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatRequest {
    /// Build a request from its three fields.
    pub fn new(
        developer_message: impl Into<String>,
        user_message: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            developer_message: developer_message.into(),
            user_message: user_message.into(),
            api_key: api_key.into(),
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// Extract the error message from a non-2xx response body.
///
/// Uses the `detail` field when it is a non-empty string, and the generic
/// backend message for anything else: invalid JSON, a missing field, or a
/// non-string `detail`.
pub fn backend_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string())
}

/// Join the chat path onto a base URL, tolerating a trailing slash.
pub fn chat_url(base_url: &str) -> String {
    format!("{}{CHAT_PATH}", base_url.trim_end_matches('/'))
}
