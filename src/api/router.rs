use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::chat;
use super::health;
use super::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create the router with application state
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/chat/", post(chat::chat))
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::api::state::mock::MockBackendSelector;

    fn app(selector: MockBackendSelector) -> Router {
        create_router(AppState::new(Arc::new(selector)))
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockBackendSelector::new(&[]))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["providers"], serde_json::json!(["openai", "anthropic", "cohere"]));
    }

    #[tokio::test]
    async fn test_chat_complete() {
        let response = app(MockBackendSelector::new(&["Hello", ", world!"]))
            .oneshot(chat_request(serde_json::json!({
                "message": "Hi",
                "chat_model_name": "openai"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"response":"Hello, world!"}"#);
    }

    #[tokio::test]
    async fn test_chat_stream_is_ndjson() {
        let response = app(MockBackendSelector::new(&["", "Hi", " there", ""]))
            .oneshot(chat_request(serde_json::json!({
                "message": "Greet me",
                "chat_model_name": "cohere-style",
                "stream": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-ndjson"
        );
        assert_eq!(
            body_string(response).await,
            "{\"delta\":\"Hi\"}\n{\"delta\":\" there\"}\n{\"response\":\"Hi there\"}\n"
        );
    }

    #[tokio::test]
    async fn test_chat_unknown_provider_is_not_found() {
        let response = app(MockBackendSelector::new(&["unused"]))
            .oneshot(chat_request(serde_json::json!({
                "message": "Hi",
                "chat_model_name": "unknown-provider"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["message"], "Unsupported provider: unknown-provider");
        assert_eq!(json["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_bad_gateway() {
        let response = app(MockBackendSelector::failing("HTTP 500: boom"))
            .oneshot(chat_request(serde_json::json!({
                "message": "Hi",
                "chat_model_name": "anthropic"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["message"], "An error occurred.");
        assert_eq!(json["error"]["code"], "anthropic");
    }

    #[tokio::test]
    async fn test_chat_missing_field_is_rejected() {
        let response = app(MockBackendSelector::new(&[]))
            .oneshot(chat_request(serde_json::json!({ "message": "Hi" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "json_parse_error");
    }
}
