use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::HttpClientTrait;
use super::stream_decoder::{decode_json, json_lines};
use crate::domain::chat::merge_extra;
use crate::domain::{
    ChatBackend, ChatResponse, ChatRole, ChatTurn, DomainError, ProviderKind, ResponseNormalizer,
    SendOptions, normalize_stream,
};

const PROVIDER: &str = "cohere";
const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.ai";
const DEFAULT_MODEL: &str = "command";

/// Cohere chat backend
///
/// Cohere takes the new message separately from the prior turns, so the
/// request's `chat_history` is every turn before the one just appended.
#[derive(Debug)]
pub struct CohereBackend<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    default_model: String,
}

impl<C: HttpClientTrait> CohereBackend<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_COHERE_BASE_URL)
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
            base_url,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat", self.base_url)
    }

    fn build_request(&self, message: &str, options: &SendOptions, stream: bool) -> serde_json::Value {
        let prior = options.history.len().saturating_sub(1);
        let chat_history: Vec<CohereChatMessage> = options.history[..prior]
            .iter()
            .map(CohereChatMessage::from_domain)
            .collect();

        let connectors = options
            .extra
            .get("connectors")
            .cloned()
            .unwrap_or_else(|| serde_json::json!([]));

        let mut body = serde_json::json!({
            "message": message,
            "model": options.model_or(&self.default_model),
            "chat_history": chat_history,
            "connectors": connectors,
            "stream": stream,
        });

        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        merge_extra(&mut body, &options.extra);
        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatBackend for CohereBackend<C> {
    async fn send_message(
        &self,
        message: &str,
        stream: bool,
        options: &mut SendOptions,
    ) -> Result<ChatResponse, DomainError> {
        options.push_user_turn(message);

        let url = self.chat_url();
        let body = self.build_request(message, options, stream);

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

            let response: CohereChatResponse = serde_json::from_value(json).map_err(|e| {
                DomainError::upstream(PROVIDER, format!("Failed to parse response: {}", e))
            })?;

            return Ok(ChatResponse::Complete(
                CohereNormalizer::normalize_response(&response),
            ));
        }

        let byte_stream = self
            .client
            .post_json_stream(&url, &self.headers(), &body)
            .await
            .map_err(|e| e.for_provider(PROVIDER))?;

        let events = json_lines(byte_stream).map(|item| {
            item.map_err(|e| e.for_provider(PROVIDER))
                .and_then(|line| decode_json::<CohereStreamEvent>(PROVIDER, &line))
        });

        Ok(ChatResponse::Stream(normalize_stream::<CohereNormalizer, _>(events)))
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::Cohere
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Text extraction rules for Cohere chat responses and stream events
#[derive(Debug)]
pub struct CohereNormalizer;

impl ResponseNormalizer for CohereNormalizer {
    type Response = CohereChatResponse;
    type Event = CohereStreamEvent;

    fn normalize_response(response: &CohereChatResponse) -> String {
        response.text.clone()
    }

    fn normalize_event(event: &CohereStreamEvent) -> String {
        match event {
            CohereStreamEvent::StreamStart { .. } => String::new(),
            CohereStreamEvent::TextGeneration { text } => text.clone(),
            CohereStreamEvent::StreamEnd { .. } => String::new(),
            CohereStreamEvent::Other => String::new(),
        }
    }
}

// Cohere API types

#[derive(Debug, Serialize)]
struct CohereChatMessage<'a> {
    role: &'static str,
    message: &'a str,
}

impl<'a> CohereChatMessage<'a> {
    fn from_domain(turn: &'a ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::User => "USER",
            ChatRole::Assistant => "CHATBOT",
        };

        Self {
            role,
            message: &turn.content,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohereChatResponse {
    pub text: String,
    #[serde(default)]
    pub generation_id: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One line of a Cohere chat stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type", rename_all = "kebab-case")]
pub enum CohereStreamEvent {
    StreamStart {
        #[serde(default)]
        generation_id: Option<String>,
    },
    TextGeneration {
        text: String,
    },
    StreamEnd {
        #[serde(default)]
        finish_reason: Option<String>,
    },
    /// search-queries-generation, citation-generation, tool-calls-generation, ...
    #[serde(other)]
    Other,
}
