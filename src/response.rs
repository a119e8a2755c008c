//! Plain-text extraction from chat completion payloads
//!
//! Chat models answer with either a string or a list of content parts
//! (strings or objects carrying `text` / `content`). Everything downstream
//! wants one string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chat completion result as seen by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub content: ResponseContent,
}

impl ChatResponse {
    pub fn new(content: impl Into<ResponseContent>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn text(&self) -> String {
        extract_text(self)
    }
}

/// The `content` field of a completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ResponseContent {
    Text(String),
    Parts(Vec<ContentPart>),
    /// Any other shape (number, object, null), rendered as-is
    Other(Value),
}

impl Default for ResponseContent {
    fn default() -> Self {
        ResponseContent::Other(Value::Null)
    }
}

/// One element of a content list
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Fields(Map<String, Value>),
    Other(Value),
}

impl From<Value> for ContentPart {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ContentPart::Text(text),
            Value::Object(fields) => ContentPart::Fields(fields),
            other => ContentPart::Other(other),
        }
    }
}

impl From<ContentPart> for Value {
    fn from(part: ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Value::String(text),
            ContentPart::Fields(fields) => Value::Object(fields),
            ContentPart::Other(value) => value,
        }
    }
}

impl From<Value> for ResponseContent {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ResponseContent::Text(text),
            Value::Array(items) => {
                ResponseContent::Parts(items.into_iter().map(ContentPart::from).collect())
            }
            other => ResponseContent::Other(other),
        }
    }
}

impl From<ResponseContent> for Value {
    fn from(content: ResponseContent) -> Self {
        match content {
            ResponseContent::Text(text) => Value::String(text),
            ResponseContent::Parts(parts) => {
                Value::Array(parts.into_iter().map(Value::from).collect())
            }
            ResponseContent::Other(value) => value,
        }
    }
}

impl From<&str> for ResponseContent {
    fn from(text: &str) -> Self {
        ResponseContent::Text(text.to_string())
    }
}

impl From<String> for ResponseContent {
    fn from(text: String) -> Self {
        ResponseContent::Text(text)
    }
}

impl From<Vec<ContentPart>> for ResponseContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        ResponseContent::Parts(parts)
    }
}

/// Flatten a completion into plain text. Never fails.
pub fn extract_text(response: &ChatResponse) -> String {
    match &response.content {
        ResponseContent::Text(text) => text.clone(),
        ResponseContent::Parts(parts) => parts
            .iter()
            .filter_map(ContentPart::fragment)
            .collect::<Vec<_>>()
            .join("\n"),
        ResponseContent::Other(value) => render_value(value),
    }
}

impl ContentPart {
    /// Text this part contributes, if any. `text` wins over `content`;
    /// a key holding null counts as missing.
    fn fragment(&self) -> Option<String> {
        let present = |value: &&Value| !value.is_null();
        match self {
            ContentPart::Text(text) => Some(text.clone()),
            ContentPart::Fields(fields) => fields
                .get("text")
                .filter(present)
                .or_else(|| fields.get("content").filter(present))
                .map(render_value),
            ContentPart::Other(_) => None,
        }
    }
}

/// String form of an arbitrary JSON value; strings unquoted, null empty
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content: Value) -> ChatResponse {
        ChatResponse::new(ResponseContent::from(content))
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(extract_text(&response(json!("hi"))), "hi");
        assert_eq!(extract_text(&ChatResponse::new("  spaced  ")), "  spaced  ");
    }

    #[test]
    fn test_mixed_parts_in_order() {
        let payload = json!([{"text": "a"}, "b", {"content": "c"}, {"other": "d"}]);
        assert_eq!(extract_text(&response(payload)), "a\nb\nc");
    }

    #[test]
    fn test_text_key_wins_over_content() {
        let payload = json!([{"content": "second", "text": "first"}]);
        assert_eq!(extract_text(&response(payload)), "first");
    }

    #[test]
    fn test_null_text_key_is_missing() {
        let payload = json!([{"text": null, "content": "c"}, {"text": null}, "b"]);
        assert_eq!(extract_text(&response(payload)), "c
b");
    }

    #[test]
    fn test_non_text_parts_are_skipped() {
        let payload = json!(["a", 1, null, ["nested"], "b"]);
        assert_eq!(extract_text(&response(payload)), "a\nb");
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(extract_text(&response(json!([]))), "");
    }

    #[test]
    fn test_fallback_stringification() {
        assert_eq!(extract_text(&response(json!(42))), "42");
        assert_eq!(extract_text(&response(json!(true))), "true");
        assert_eq!(extract_text(&response(json!({"a": 1}))), "{\"a\":1}");
        assert_eq!(extract_text(&response(Value::Null)), "");
    }

    #[test]
    fn test_deserialize_chat_response_shapes() {
        let text: ChatResponse = serde_json::from_str(r#"{"content": "hello"}"#).unwrap();
        assert_eq!(text.content, ResponseContent::Text("hello".to_string()));

        let parts: ChatResponse =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": "x"}]}"#).unwrap();
        assert_eq!(parts.text(), "x");

        let missing: ChatResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.text(), "");
    }
}
