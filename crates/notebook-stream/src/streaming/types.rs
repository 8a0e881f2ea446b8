//! Types for decoded stream events

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A decoded event from a notebook stream
///
/// The record is open: any JSON object is an event. The four named fields are
/// filled when their value has the expected type; everything else, including
/// a named field of another type, is kept in `extra` and serialized back out
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent {
    /// Event type (`content`, `done`, `error`, ...), empty when absent
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub event_type: String,

    /// Text delta for `content` events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Human-readable reason for `error` events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Conversation the server stored the exchange under (sent with `done`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,

    /// Any other fields carried by the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for StreamEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::deserialize(deserializer).map(Self::from_fields)
    }
}

/// Coarse classification of an event's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Content,
    Done,
    Error,
    Other,
}

impl StreamEvent {
    /// Create an event of the given type with no other fields
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            content: None,
            message: None,
            conversation_id: None,
            extra: Map::new(),
        }
    }

    /// Build an event from the members of a JSON object
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        let event_type = take_field(&mut fields, "type", as_string).unwrap_or_default();
        let content = take_field(&mut fields, "content", as_string);
        let message = take_field(&mut fields, "message", as_string);
        let conversation_id = take_field(&mut fields, "conversation_id", as_whole_number);

        Self {
            event_type,
            content,
            message,
            conversation_id,
            extra: fields,
        }
    }

    /// Create a terminal `error` event
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new("error")
        }
    }

    /// Create a `content` event
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::new("content")
        }
    }

    /// Classify the event type
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "content" => EventKind::Content,
            "done" => EventKind::Done,
            "error" => EventKind::Error,
            _ => EventKind::Other,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind() == EventKind::Error
    }

    pub fn is_done(&self) -> bool {
        self.kind() == EventKind::Done
    }

    /// Reason carried by an error event
    ///
    /// The content-generation endpoint reports some failures in `content`
    /// instead of `message`, so this falls back to it.
    pub fn error_text(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.message.as_deref().or(self.content.as_deref())
    }

    /// Get a pass-through field as a specific type
    pub fn get<T: serde::de::DeserializeOwned>(&self, field: &str) -> Option<T> {
        self.extra
            .get(field)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Check if a pass-through field is present
    pub fn has(&self, field: &str) -> bool {
        self.extra.contains_key(field)
    }
}

/// Remove `key` from `fields` if it converts; `null` counts as absent
fn take_field<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key)?;
    if value.is_null() {
        fields.remove(key);
        return None;
    }
    let converted = convert(value)?;
    fields.remove(key);
    Some(converted)
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Integers, or floats without a fractional part such as `7.0`
fn as_whole_number(value: &Value) -> Option<i64> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_EXACT)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_known_fields() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"done","conversation_id":42}"#).unwrap();
        assert_eq!(event.kind(), EventKind::Done);
        assert_eq!(event.conversation_id, Some(42));
        assert!(event.content.is_none());
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let json = r#"{"type":"progress","percent":40,"stage":"outline"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.kind(), EventKind::Other);
        assert_eq!(event.get::<u32>("percent"), Some(40));
        assert_eq!(event.get::<String>("stage").as_deref(), Some("outline"));
        assert!(!event.has("missing"));

        let back: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(json).unwrap());
    }

    #[test]
    fn test_missing_type_defaults_to_empty() {
        let event: StreamEvent = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(event.event_type, "");
        assert_eq!(event.kind(), EventKind::Other);
    }

    #[test]
    fn test_mistyped_known_fields_move_to_extra() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"content","content":123,"message":{"a":1}}"#)
                .unwrap();
        assert_eq!(event.kind(), EventKind::Content);
        assert!(event.content.is_none());
        assert!(event.message.is_none());
        assert_eq!(event.get::<i64>("content"), Some(123));
        assert!(event.has("message"));

        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"done","conversation_id":"7"}"#).unwrap();
        assert!(event.conversation_id.is_none());
        assert_eq!(event.get::<String>("conversation_id").as_deref(), Some("7"));
    }

    #[test]
    fn test_whole_float_conversation_id() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"done","conversation_id":7.0}"#).unwrap();
        assert_eq!(event.conversation_id, Some(7));
        assert!(event.extra.is_empty());

        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"done","conversation_id":7.5}"#).unwrap();
        assert!(event.conversation_id.is_none());
        assert!(event.has("conversation_id"));
    }

    #[test]
    fn test_null_fields_are_absent() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":null,"content":null}"#).unwrap();
        assert_eq!(event.event_type, "");
        assert!(event.content.is_none());
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(serde_json::from_str::<StreamEvent>("[1,2]").is_err());
        assert!(serde_json::from_str::<StreamEvent>("\"content\"").is_err());
        assert!(serde_json::from_str::<StreamEvent>("null").is_err());
    }

    #[test]
    fn test_mistyped_field_round_trips() {
        let json = r#"{"type":"content","content":123,"conversation_id":"7"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(json).unwrap());
    }

    #[test]
    fn test_error_text_falls_back_to_content() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"error","content":"LLM generation failed"}"#)
                .unwrap();
        assert_eq!(event.error_text(), Some("LLM generation failed"));

        let event = StreamEvent::error("bad request");
        assert_eq!(event.error_text(), Some("bad request"));

        assert_eq!(StreamEvent::content("hi").error_text(), None);
    }

    #[test]
    fn test_error_event_serialization() {
        let json = serde_json::to_string(&StreamEvent::error("No response body")).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"No response body"}"#);
    }
}
