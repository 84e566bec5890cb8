//! Chat endpoint handler

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ChatReply, ChatRequest, GENERIC_ERROR_MESSAGE, Json, StreamRecord};
use crate::domain::{ChatResponse, DomainError, FragmentStream};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// POST /chat/
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(
        request_id = %request_id,
        chat_model_name = %request.chat_model_name,
        stream = request.stream,
        "Processing chat request"
    );

    let backend = state
        .backends
        .select(&request.chat_model_name)
        .await
        .map_err(|e| log_failure(&request_id, e))?;

    let mut options = request.send_options();
    let response = backend
        .send_message(&request.message, request.stream, &mut options)
        .await
        .map_err(|e| log_failure(&request_id, e))?;

    match response {
        ChatResponse::Complete(text) => Ok(Json(ChatReply { response: text }).into_response()),
        ChatResponse::Stream(fragments) => Ok((
            [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
            Body::from_stream(ndjson_records(fragments, request_id)),
        )
            .into_response()),
    }
}

fn log_failure(request_id: &str, err: DomainError) -> ApiError {
    error!(request_id = %request_id, error = %err, "Chat request failed");
    ApiError::from(err)
}

/// Turn a fragment stream into NDJSON lines.
///
/// Each non-empty fragment becomes a `{"delta"}` line as it arrives; the
/// concatenated text follows as a final `{"response"}` line. A failing
/// fragment ends the body with an `{"error"}` line instead.
fn ndjson_records(
    fragments: FragmentStream,
    request_id: String,
) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send {
    stream::unfold(
        Some((fragments, String::new())),
        move |state| {
            let request_id = request_id.clone();
            async move {
                let (mut fragments, mut buffer) = state?;

                loop {
                    match fragments.next().await {
                        Some(Ok(fragment)) if fragment.is_empty() => continue,
                        Some(Ok(fragment)) => {
                            buffer.push_str(&fragment);
                            let line = ndjson_line(&StreamRecord::Delta { delta: fragment });
                            return Some((Ok::<_, Infallible>(line), Some((fragments, buffer))));
                        }
                        Some(Err(e)) => {
                            error!(request_id = %request_id, error = %e, "Stream failed");
                            let line = ndjson_line(&StreamRecord::Error {
                                error: GENERIC_ERROR_MESSAGE.to_string(),
                            });
                            return Some((Ok::<_, Infallible>(line), None));
                        }
                        None => {
                            info!(request_id = %request_id, length = buffer.len(), "Stream complete");
                            let line = ndjson_line(&StreamRecord::Response { response: buffer });
                            return Some((Ok::<_, Infallible>(line), None));
                        }
                    }
                }
            }
        },
    )
}

fn ndjson_line(record: &StreamRecord) -> Bytes {
    let value = match record {
        StreamRecord::Delta { delta } => serde_json::json!({ "delta": delta }),
        StreamRecord::Response { response } => serde_json::json!({ "response": response }),
        StreamRecord::Error { error } => serde_json::json!({ "error": error }),
    };

    let mut line = value.to_string();
    line.push('\n');
    Bytes::from(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect_lines(fragments: Vec<Result<String, DomainError>>) -> Vec<StreamRecord> {
        let body: Vec<Bytes> = ndjson_records(Box::pin(stream::iter(fragments)), "req-1".into())
            .map(|line| line.unwrap())
            .collect()
            .await;

        body.iter()
            .map(|line| {
                assert!(line.ends_with(b"\n"));
                serde_json::from_slice(line).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_ndjson_skips_empty_fragments_and_ends_with_response() {
        let records = collect_lines(vec![
            Ok(String::new()),
            Ok("Hello".into()),
            Ok(String::new()),
            Ok(", world!".into()),
            Ok(String::new()),
        ])
        .await;

        assert_eq!(
            records,
            vec![
                StreamRecord::Delta { delta: "Hello".into() },
                StreamRecord::Delta { delta: ", world!".into() },
                StreamRecord::Response { response: "Hello, world!".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_ndjson_empty_stream_yields_empty_response() {
        let records = collect_lines(vec![]).await;

        assert_eq!(records, vec![StreamRecord::Response { response: String::new() }]);
    }

    #[tokio::test]
    async fn test_ndjson_error_ends_body() {
        let records = collect_lines(vec![
            Ok("partial".into()),
            Err(DomainError::upstream("anthropic", "overloaded_error: Overloaded")),
            Ok("never sent".into()),
        ])
        .await;

        assert_eq!(
            records,
            vec![
                StreamRecord::Delta { delta: "partial".into() },
                StreamRecord::Error { error: GENERIC_ERROR_MESSAGE.into() },
            ]
        );
    }

    #[test]
    fn test_ndjson_line_escapes_content() {
        let line = ndjson_line(&StreamRecord::Delta { delta: "a \"quoted\"\nline".into() });
        assert_eq!(&line[..], b"{\"delta\":\"a \\\"quoted\\\"\\nline\"}\n");
    }
}
