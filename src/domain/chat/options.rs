use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ChatTurn;

/// Per-call options for [`ChatBackend::send_message`](super::ChatBackend::send_message)
///
/// `history` is an in/out parameter: the backend appends the new user turn
/// to it before calling the provider. Callers that want multi-turn context
/// keep the same options value (or its history) around between calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendOptions {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Model identifier; the backend's default model when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Provider-specific options merged verbatim into the request body
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Resolve the model to use, falling back to the backend default
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }

    /// Append `message` as a new user turn
    pub(crate) fn push_user_turn(&mut self, message: &str) {
        self.history.push(ChatTurn::user(message));
    }
}

/// Merge passthrough options into a provider request body.
///
/// Keys the backend already set (model, messages, stream flag) win over
/// passthrough entries of the same name.
pub(crate) fn merge_extra(body: &mut Value, extra: &Map<String, Value>) {
    if let Value::Object(map) = body {
        for (key, value) in extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ChatRole;

    #[test]
    fn test_options_builder() {
        let options = SendOptions::new()
            .with_model("gpt-4o")
            .with_max_tokens(256)
            .with_extra("temperature", serde_json::json!(0.2));

        assert_eq!(options.model_or("fallback"), "gpt-4o");
        assert_eq!(options.max_tokens, Some(256));
        assert_eq!(options.extra.get("temperature"), Some(&serde_json::json!(0.2)));
        assert!(options.history.is_empty());
    }

    #[test]
    fn test_model_fallback() {
        let options = SendOptions::new();
        assert_eq!(options.model_or("command"), "command");
    }

    #[test]
    fn test_push_user_turn_appends_only() {
        let mut options = SendOptions::new().with_history(vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("reply"),
        ]);

        options.push_user_turn("hi");

        assert_eq!(options.history.len(), 3);
        assert_eq!(options.history[0], ChatTurn::user("first"));
        assert_eq!(options.history[1], ChatTurn::assistant("reply"));
        assert_eq!(options.history[2].role, ChatRole::User);
        assert_eq!(options.history[2].content, "hi");
    }

    #[test]
    fn test_merge_extra_keeps_backend_fields() {
        let mut body = serde_json::json!({ "model": "a", "stream": false });
        let extra = SendOptions::new()
            .with_extra("model", serde_json::json!("b"))
            .with_extra("connectors", serde_json::json!([{ "id": "web-search" }]))
            .extra;

        merge_extra(&mut body, &extra);

        assert_eq!(body["model"], "a");
        assert_eq!(body["connectors"][0]["id"], "web-search");
        assert_eq!(body["stream"], false);
    }
}
