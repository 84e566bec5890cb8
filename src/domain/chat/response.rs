use std::fmt;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::domain::DomainError;

/// Lazy sequence of normalized text fragments
///
/// Each item corresponds to one upstream event. Concatenating every `Ok`
/// item in order yields the full response text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Uniform result of a chat backend call
pub enum ChatResponse {
    /// The whole response text (non-streaming call)
    Complete(String),
    /// Fragments produced as the provider delivers events (streaming call)
    Stream(FragmentStream),
}

impl ChatResponse {
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Drain the response into a single string.
    ///
    /// A streaming response is consumed to the end; the first error aborts.
    pub async fn into_text(self) -> Result<String, DomainError> {
        match self {
            Self::Complete(text) => Ok(text),
            Self::Stream(mut stream) => {
                let mut buffer = String::new();

                while let Some(fragment) = stream.next().await {
                    buffer.push_str(&fragment?);
                }

                Ok(buffer)
            }
        }
    }

    /// View the response as a fragment stream regardless of mode
    pub fn into_stream(self) -> FragmentStream {
        match self {
            Self::Complete(text) => Box::pin(futures::stream::once(async move { Ok(text) })),
            Self::Stream(stream) => stream,
        }
    }
}

impl fmt::Debug for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn fragments(items: Vec<Result<String, DomainError>>) -> ChatResponse {
        ChatResponse::Stream(Box::pin(stream::iter(items)))
    }

    #[tokio::test]
    async fn test_complete_into_text() {
        let response = ChatResponse::Complete("Hello".to_string());
        assert!(!response.is_stream());
        assert_eq!(response.into_text().await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_stream_into_text_concatenates_empty_fragments() {
        let response = fragments(vec![
            Ok(String::new()),
            Ok("Hi".to_string()),
            Ok(" there".to_string()),
            Ok(String::new()),
        ]);

        assert!(response.is_stream());
        assert_eq!(response.into_text().await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn test_stream_into_text_propagates_error() {
        let response = fragments(vec![
            Ok("partial".to_string()),
            Err(DomainError::upstream("anthropic", "overloaded")),
        ]);

        let err = response.into_text().await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_complete_into_stream_yields_single_fragment() {
        let stream = ChatResponse::Complete("Hello".to_string()).into_stream();
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "Hello");
    }
}
