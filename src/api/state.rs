//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::{ChatBackend, DomainError};
use crate::infrastructure::llm::ChatBackendFactory;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub backends: Arc<dyn BackendSelectorTrait>,
}

impl AppState {
    pub fn new(backends: Arc<dyn BackendSelectorTrait>) -> Self {
        Self { backends }
    }
}

/// Resolves a provider identifier to a ready backend
#[async_trait::async_trait]
pub trait BackendSelectorTrait: Send + Sync {
    async fn select(&self, name: &str) -> Result<Arc<dyn ChatBackend>, DomainError>;

    fn supported(&self) -> Vec<&'static str>;
}

#[async_trait::async_trait]
impl BackendSelectorTrait for ChatBackendFactory {
    async fn select(&self, name: &str) -> Result<Arc<dyn ChatBackend>, DomainError> {
        self.create(name).await
    }

    fn supported(&self) -> Vec<&'static str> {
        ChatBackendFactory::supported_providers()
    }
}
