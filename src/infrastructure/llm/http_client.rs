use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;
use std::time::Duration;

use crate::domain::DomainError;

/// Response body delivered chunk by chunk
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DomainError>> + Send>>;

/// Upper bound on how much of an error body ends up in the error message
const MAX_ERROR_BODY: usize = 512;

/// HTTP transport used by the chat backends
///
/// Failures are reported as [`DomainError::Upstream`] tagged `http`; callers
/// re-tag them with their provider name.
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POST a JSON body and decode the JSON reply
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;

    /// POST a JSON body and hand back the reply body as it arrives.
    ///
    /// Resolves once the status is known; the body is only read while the
    /// returned stream is polled.
    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<ByteStream, DomainError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
    // Whole-request limit for non-streamed calls
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client bounded by `timeout`.
    ///
    /// Plain requests must complete within `timeout`. Streamed bodies may run
    /// longer, but fail once connecting or waiting for the next chunk takes
    /// longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: Some(timeout),
        })
    }

    async fn send(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
        whole_request_timeout: Option<Duration>,
    ) -> Result<reqwest::Response, DomainError> {
        let mut request = headers
            .iter()
            .fold(self.client.post(url), |request, (name, value)| {
                request.header(*name, *value)
            });

        if let Some(timeout) = whole_request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.json(body).send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut detail = response.text().await.unwrap_or_default();
        if detail.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| detail.is_char_boundary(*i))
                .unwrap_or(0);
            detail.truncate(cut);
        }

        Err(DomainError::upstream("http", format!("HTTP {}: {}", status, detail)))
    }
}

fn transport_error(err: reqwest::Error) -> DomainError {
    let message = if err.is_timeout() {
        format!("Request timed out: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else {
        format!("Request failed: {}", err)
    };

    DomainError::upstream("http", message)
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let response = self.send(url, headers, body, self.timeout).await?;

        response
            .json()
            .await
            .map_err(|e| DomainError::upstream("http", format!("Invalid JSON body: {}", e)))
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<ByteStream, DomainError> {
        let response = self.send(url, headers, body, None).await?;

        Ok(Box::pin(response.bytes_stream().map_err(transport_error)))
    }
}
