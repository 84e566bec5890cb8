use async_trait::async_trait;
use std::fmt::Debug;

use super::{ChatResponse, ProviderKind, SendOptions};
use crate::domain::DomainError;

/// Uniform contract every chat backend satisfies
#[async_trait]
pub trait ChatBackend: Send + Sync + Debug {
    /// Send `message` as a new user turn.
    ///
    /// The turn is appended to `options.history` before the provider is
    /// called. With `stream = false` the result is
    /// [`ChatResponse::Complete`]; otherwise it is a lazy
    /// [`ChatResponse::Stream`] of normalized fragments.
    async fn send_message(
        &self,
        message: &str,
        stream: bool,
        options: &mut SendOptions,
    ) -> Result<ChatResponse, DomainError>;

    /// Which provider this backend talks to
    fn provider(&self) -> ProviderKind;

    /// Model used when the caller does not name one
    fn default_model(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;

    /// Backend returning canned fragments; records nothing beyond history
    #[derive(Debug)]
    pub struct MockChatBackend {
        provider: ProviderKind,
        fragments: Vec<String>,
        error: Option<String>,
    }

    impl MockChatBackend {
        pub fn new(provider: ProviderKind) -> Self {
            Self {
                provider,
                fragments: Vec::new(),
                error: None,
            }
        }

        pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
            self.fragments = fragments.iter().map(|f| f.to_string()).collect();
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }
    }

    #[async_trait]
    impl ChatBackend for MockChatBackend {
        async fn send_message(
            &self,
            message: &str,
            stream: bool,
            options: &mut SendOptions,
        ) -> Result<ChatResponse, DomainError> {
            options.push_user_turn(message);

            if let Some(ref error) = self.error {
                return Err(DomainError::upstream(self.provider.as_str(), error));
            }

            if stream {
                let items: Vec<Result<String, DomainError>> =
                    self.fragments.iter().cloned().map(Ok).collect();
                Ok(ChatResponse::Stream(Box::pin(stream::iter(items))))
            } else {
                Ok(ChatResponse::Complete(self.fragments.concat()))
            }
        }

        fn provider(&self) -> ProviderKind {
            self.provider
        }

        fn default_model(&self) -> &str {
            "mock-model"
        }
    }
}
