//! HTTP request, response and error types

pub mod chat;
pub mod error;
pub mod json;

pub use chat::{ChatReply, ChatRequest, StreamRecord};
pub use error::{ApiError, ApiErrorResponse, GENERIC_ERROR_MESSAGE};
pub use json::Json;
