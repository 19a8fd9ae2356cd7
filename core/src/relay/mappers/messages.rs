//! Chat message normalization and conversion to the responses API format

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value_to_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Unknown or missing roles are treated as user input
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("system") => Role::System,
            Some("assistant") => Role::Assistant,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    /// Coerce one caller-supplied entry; never fails
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(obj) => Self {
                role: Role::parse(obj.get("role").and_then(|v| v.as_str())),
                content: obj.get("content").map(value_to_text).unwrap_or_default(),
            },
            other => Self::new(Role::User, value_to_text(other)),
        }
    }
}

/// One item of the responses API `input` array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputItem {
    pub role: Role,
    pub content: Vec<InputContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl From<&ChatMessage> for InputItem {
    fn from(msg: &ChatMessage) -> Self {
        let kind = match msg.role {
            Role::Assistant => "output_text",
            _ => "input_text",
        };
        Self {
            role: msg.role,
            content: vec![InputContent { kind, text: msg.content.clone() }],
        }
    }
}

/// Extract `messages` from a chat request body. A missing or non-array
/// field yields an empty conversation.
pub fn extract_messages(body: &Value) -> Vec<ChatMessage> {
    body.get("messages")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(ChatMessage::from_value).collect())
        .unwrap_or_default()
}

/// Prepend the system prompt, keeping caller order for the rest
pub fn normalize(system_prompt: &str, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut normalized = Vec::with_capacity(messages.len() + 1);
    normalized.push(ChatMessage::new(Role::System, system_prompt));
    normalized.extend(messages);
    normalized
}

pub fn to_input_items(messages: &[ChatMessage]) -> Vec<InputItem> {
    messages.iter().map(InputItem::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_prompt_always_comes_first() {
        let body = json!({
            "messages": [
                {"role": "assistant", "content": "Добрый день!"},
                {"role": "system", "content": "caller system"},
                {"role": "user", "content": "hi"}
            ]
        });
        let normalized = normalize("PROMPT", extract_messages(&body));

        assert_eq!(normalized.len(), 4);
        assert_eq!(normalized[0], ChatMessage::new(Role::System, "PROMPT"));
        assert_eq!(normalized[1].role, Role::Assistant);
        assert_eq!(normalized[2].content, "caller system");
        assert_eq!(normalized[3].content, "hi");
    }

    #[test]
    fn missing_messages_sends_prompt_alone() {
        for body in [json!({}), json!({"messages": null}), json!({"messages": "x"}), json!([])] {
            let normalized = normalize("PROMPT", extract_messages(&body));
            assert_eq!(normalized, vec![ChatMessage::new(Role::System, "PROMPT")]);
        }
    }

    #[test]
    fn malformed_entries_are_coerced() {
        let body = json!({
            "messages": [
                {"role": "tool", "content": 5},
                {"content": null},
                {"role": "user", "content": {"nested": true}},
                "bare string",
                7
            ]
        });
        let messages = extract_messages(&body);

        assert_eq!(messages[0], ChatMessage::new(Role::User, "5"));
        assert_eq!(messages[1], ChatMessage::new(Role::User, ""));
        assert_eq!(messages[2].content, r#"{"nested":true}"#);
        assert_eq!(messages[3], ChatMessage::new(Role::User, "bare string"));
        assert_eq!(messages[4], ChatMessage::new(Role::User, "7"));
    }

    #[test]
    fn assistant_turns_become_output_text() {
        let items = to_input_items(&[
            ChatMessage::new(Role::System, "p"),
            ChatMessage::new(Role::Assistant, "a"),
            ChatMessage::new(Role::User, "u"),
        ]);
        let value = serde_json::to_value(&items).unwrap();

        assert_eq!(
            value,
            json!([
                {"role": "system", "content": [{"type": "input_text", "text": "p"}]},
                {"role": "assistant", "content": [{"type": "output_text", "text": "a"}]},
                {"role": "user", "content": [{"type": "input_text", "text": "u"}]}
            ])
        );
    }
}
