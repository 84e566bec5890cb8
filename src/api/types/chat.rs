//! Request and response bodies for `POST /chat/`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ChatTurn, SendOptions};

/// Chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Provider identifier, e.g. `openai` or `anthropic-style`
    pub chat_model_name: String,
    #[serde(default)]
    pub stream: bool,

    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Prior turns of the conversation
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Provider-specific request fields
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ChatRequest {
    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            history: self.history.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            extra: self.options.clone(),
        }
    }
}

/// Non-streaming reply, also the final record of a streamed reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// One line of an `application/x-ndjson` streamed reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamRecord {
    Delta { delta: String },
    Response { response: String },
    Error { error: String },
}
