use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::future;
use tracing::debug;

use super::http_client::HttpClientTrait;
use super::stream_decoder::{decode_json, sse_events};
use crate::domain::chat::merge_extra;
use crate::domain::{
    ChatBackend, ChatResponse, ChatRole, ChatTurn, DomainError, NON_TEXT_RESPONSE, ProviderKind,
    ResponseNormalizer, SendOptions, normalize_stream,
};

const PROVIDER: &str = "openai";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const STREAM_DONE: &str = "[DONE]";

/// OpenAI chat completions backend
#[derive(Debug)]
pub struct OpenAiBackend<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    organization: Option<String>,
    base_url: String,
    default_model: String,
}

impl<C: HttpClientTrait> OpenAiBackend<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            organization: None,
            base_url,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, options: &SendOptions, stream: bool) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> = options
            .history
            .iter()
            .map(OpenAiMessage::from_domain)
            .collect();

        let mut body = serde_json::json!({
            "model": options.model_or(&self.default_model),
            "messages": messages,
            "stream": stream,
        });

        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        merge_extra(&mut body, &options.extra);
        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        if let Some(ref organization) = self.organization {
            headers.push(("OpenAI-Organization", organization.as_str()));
        }

        headers
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatBackend for OpenAiBackend<C> {
    async fn send_message(
        &self,
        message: &str,
        stream: bool,
        options: &mut SendOptions,
    ) -> Result<ChatResponse, DomainError> {
        options.push_user_turn(message);

        let url = self.chat_completions_url();
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

            let completion: ChatCompletion = serde_json::from_value(json).map_err(|e| {
                DomainError::upstream(PROVIDER, format!("Failed to parse response: {}", e))
            })?;

            return Ok(ChatResponse::Complete(
                OpenAiNormalizer::normalize_response(&completion),
            ));
        }

        let byte_stream = self
            .client
            .post_json_stream(&url, &self.headers(), &body)
            .await
            .map_err(|e| e.for_provider(PROVIDER))?;

        let chunks = sse_events(byte_stream)
            .take_while(|item| {
                future::ready(!matches!(item, Ok(event) if event.data.trim() == STREAM_DONE))
            })
            .map(|item| {
                item.map_err(|e| e.for_provider(PROVIDER)).and_then(|event| {
                    match decode_json::<StreamPayload>(PROVIDER, &event.data)? {
                        StreamPayload::Chunk(chunk) => Ok(chunk),
                        StreamPayload::Error { error } => Err(error.into_domain()),
                    }
                })
            });

        Ok(ChatResponse::Stream(normalize_stream::<OpenAiNormalizer, _>(chunks)))
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Text extraction rules for OpenAI completions and chunks
///
/// Both shapes use the last choice in the list.
#[derive(Debug)]
pub struct OpenAiNormalizer;

impl ResponseNormalizer for OpenAiNormalizer {
    type Response = ChatCompletion;
    type Event = ChatCompletionChunk;

    fn normalize_response(completion: &ChatCompletion) -> String {
        match completion.choices.last() {
            Some(choice) if choice.message.role == "assistant" => {
                choice.message.content.clone().unwrap_or_default()
            }
            Some(_) => NON_TEXT_RESPONSE.to_string(),
            None => String::new(),
        }
    }

    fn normalize_event(chunk: &ChatCompletionChunk) -> String {
        match chunk.choices.last() {
            Some(choice) if choice.finish_reason.is_none() => {
                choice.delta.content.clone().unwrap_or_default()
            }
            // Finished choice, or a usage-only chunk without choices
            Some(_) | None => String::new(),
        }
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> OpenAiMessage<'a> {
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

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A `data:` payload: either a chunk or an error reported mid-stream
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error { error: StreamError },
    Chunk(ChatCompletionChunk),
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl StreamError {
    fn into_domain(self) -> DomainError {
        let message = match self.kind {
            Some(kind) => format!("{}: {}", kind, self.message),
            None => self.message,
        };
        DomainError::upstream(PROVIDER, message)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
