use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::HttpClientTrait;
use super::stream_decoder::{decode_json, sse_events};
use crate::domain::chat::merge_extra;
use crate::domain::{
    ChatBackend, ChatResponse, ChatRole, ChatTurn, DomainError, NON_TEXT_RESPONSE, ProviderKind,
    ResponseNormalizer, SendOptions, normalize_stream,
};

const PROVIDER: &str = "anthropic";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-2.1";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API backend
#[derive(Debug)]
pub struct AnthropicBackend<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl<C: HttpClientTrait> AnthropicBackend<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_ANTHROPIC_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            api_key: api_key.into(),
            base_url,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_request(&self, options: &SendOptions, stream: bool) -> serde_json::Value {
        let messages: Vec<AnthropicInputMessage> = options
            .history
            .iter()
            .map(AnthropicInputMessage::from_domain)
            .collect();

        let mut body = serde_json::json!({
            "model": options.model_or(&self.default_model),
            "max_tokens": options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": messages,
            "stream": stream,
        });

        merge_extra(&mut body, &options.extra);
        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatBackend for AnthropicBackend<C> {
    async fn send_message(
        &self,
        message: &str,
        stream: bool,
        options: &mut SendOptions,
    ) -> Result<ChatResponse, DomainError> {
        options.push_user_turn(message);

        let url = self.messages_url();
        let body = self.build_request(options, stream);

        debug!(
            provider = PROVIDER,
            model = %body["model"],
            stream,
            turns = options.history.len(),
            "Sending message"
        );

        if !stream {
            let json = self
                .client
                .post_json(&url, &self.headers(), &body)
                .await
                .map_err(|e| e.for_provider(PROVIDER))?;

            let response: AnthropicMessage = serde_json::from_value(json).map_err(|e| {
                DomainError::upstream(PROVIDER, format!("Failed to parse response: {}", e))
            })?;

            return Ok(ChatResponse::Complete(
                AnthropicNormalizer::normalize_response(&response),
            ));
        }

        let byte_stream = self
            .client
            .post_json_stream(&url, &self.headers(), &body)
            .await
            .map_err(|e| e.for_provider(PROVIDER))?;

        let events = sse_events(byte_stream).map(|item| {
            item.map_err(|e| e.for_provider(PROVIDER))
                .and_then(|event| decode_stream_event(&event.data))
        });

        Ok(ChatResponse::Stream(normalize_stream::<AnthropicNormalizer, _>(events)))
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Text extraction rules for Anthropic messages and stream events
#[derive(Debug)]
pub struct AnthropicNormalizer;

impl AnthropicNormalizer {
    fn first_block_text(content: &[ContentBlock]) -> String {
        content.first().map(Self::block_text).unwrap_or_default()
    }

    fn block_text(block: &ContentBlock) -> String {
        match block {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::ToolUse { .. } | ContentBlock::Other => NON_TEXT_RESPONSE.to_string(),
        }
    }
}

impl ResponseNormalizer for AnthropicNormalizer {
    type Response = AnthropicMessage;
    type Event = AnthropicStreamEvent;

    fn normalize_response(response: &AnthropicMessage) -> String {
        Self::first_block_text(&response.content)
    }

    fn normalize_event(event: &AnthropicStreamEvent) -> String {
        match event {
            AnthropicStreamEvent::MessageStart(message) => Self::first_block_text(&message.content),
            AnthropicStreamEvent::ContentBlockStart(block) => Self::block_text(block),
            AnthropicStreamEvent::ContentBlockDelta(delta) => match delta {
                ContentDelta::TextDelta { text } => text.clone(),
                ContentDelta::Other => String::new(),
            },
            AnthropicStreamEvent::ContentBlock(block) => Self::block_text(block),
            // ping, content_block_stop, message_delta, message_stop and kinds
            // added after this was written carry no text
            AnthropicStreamEvent::Other(_) => String::new(),
        }
    }
}

/// One item of an Anthropic message stream
#[derive(Debug, Clone, PartialEq)]
pub enum AnthropicStreamEvent {
    MessageStart(AnthropicMessage),
    ContentBlockStart(ContentBlock),
    ContentBlockDelta(ContentDelta),
    /// A content block delivered without a wrapping event
    ContentBlock(ContentBlock),
    /// Any other event kind, by name
    Other(String),
}

/// Decode one `data:` payload of the message stream.
///
/// `error` events become `Err`; everything else becomes an event.
pub fn decode_stream_event(payload: &str) -> Result<AnthropicStreamEvent, DomainError> {
    let header: EventHeader = decode_json(PROVIDER, payload)?;

    let event = match header.kind.as_str() {
        "message_start" => {
            let body: MessageStartBody = decode_json(PROVIDER, payload)?;
            AnthropicStreamEvent::MessageStart(body.message)
        }
        "content_block_start" => {
            let body: ContentBlockStartBody = decode_json(PROVIDER, payload)?;
            AnthropicStreamEvent::ContentBlockStart(body.content_block)
        }
        "content_block_delta" => {
            let body: ContentBlockDeltaBody = decode_json(PROVIDER, payload)?;
            AnthropicStreamEvent::ContentBlockDelta(body.delta)
        }
        "error" => {
            let body: ErrorBody = decode_json(PROVIDER, payload)?;
            return Err(DomainError::upstream(
                PROVIDER,
                format!("{}: {}", body.error.error_type, body.error.message),
            ));
        }
        kind if is_content_block_kind(kind) => {
            AnthropicStreamEvent::ContentBlock(decode_json(PROVIDER, payload)?)
        }
        other => AnthropicStreamEvent::Other(other.to_string()),
    };

    Ok(event)
}

fn is_content_block_kind(kind: &str) -> bool {
    matches!(
        kind,
        "text"
            | "tool_use"
            | "server_tool_use"
            | "thinking"
            | "redacted_thinking"
            | "image"
            | "document"
    )
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicInputMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> AnthropicInputMessage<'a> {
    fn from_domain(turn: &'a ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };

        Self {
            role,
            content: &turn.content,
        }
    }
}

/// Message object, as returned by a non-streaming call or embedded in
/// `message_start`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnthropicMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct EventHeader {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct MessageStartBody {
    message: AnthropicMessage,
}

#[derive(Debug, Deserialize)]
struct ContentBlockStartBody {
    content_block: ContentBlock,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDeltaBody {
    delta: ContentDelta,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: AnthropicApiError,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
