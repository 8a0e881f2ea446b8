//! Request and response types for the notebook streaming endpoints

use serde::{Deserialize, Serialize};

// =============================================================================
// Chat
// =============================================================================

/// Body of a chat stream request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub notebook_id: i64,
    /// Continue an existing conversation; a new one is created when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    pub message: String,
}

impl ChatRequest {
    pub fn new(notebook_id: i64, message: impl Into<String>) -> Self {
        Self {
            notebook_id,
            conversation_id: None,
            message: message.into(),
        }
    }

    /// Continue the given conversation
    pub fn in_conversation(mut self, conversation_id: i64) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

// =============================================================================
// Content Generation
// =============================================================================

/// Body of a content generation stream request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub notebook_id: i64,
    /// Kind of content to generate (e.g. `summary`, `faq`, `mindmap`)
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl GenerateRequest {
    pub fn new(notebook_id: i64, content_type: impl Into<String>) -> Self {
        Self {
            notebook_id,
            content_type: content_type.into(),
            custom_prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error body returned with a non-success status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// A string for most errors; validation failures send a list of objects
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable reason for a rejected request
    ///
    /// Uses the server's `detail` when the body carries one, otherwise
    /// `HTTP <status>`.
    pub fn reason(status: u16, body: Option<&[u8]>) -> String {
        body.and_then(|b| serde_json::from_slice::<ErrorBody>(b).ok())
            .and_then(|b| b.detail_text())
            .unwrap_or_else(|| format!("HTTP {}", status))
    }

    fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if messages.is_empty() {
                    Some(serde_json::Value::Array(items.clone()).to_string())
                } else {
                    Some(messages.join("; "))
                }
            }
            other => Some(other.to_string()),
        }
    }
}
