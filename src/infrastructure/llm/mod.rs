//! Chat backend implementations

mod anthropic;
mod cohere;
mod factory;
mod http_client;
mod openai;
pub mod stream_decoder;

pub use anthropic::{
    AnthropicBackend, AnthropicMessage, AnthropicNormalizer, AnthropicStreamEvent, ContentBlock,
    ContentDelta, decode_stream_event,
};
pub use cohere::{CohereBackend, CohereChatResponse, CohereNormalizer, CohereStreamEvent};
pub use factory::ChatBackendFactory;
pub use http_client::{ByteStream, HttpClient, HttpClientTrait};
pub use openai::{
    ChatCompletion, ChatCompletionChunk, Choice, ChoiceMessage, ChunkChoice, ChunkDelta,
    OpenAiBackend, OpenAiNormalizer,
};
