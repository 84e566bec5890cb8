//! Chat Gateway
//!
//! One chat contract over several LLM providers:
//! - Per-provider normalizers that reduce responses and stream events to text
//! - Chat backends that append turns to history and return text or a lazy
//!   fragment stream
//! - A factory that selects a backend by provider identifier
//! - An HTTP endpoint (`POST /chat/`) exposing the contract

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::{ChatBackendFactory, EnvCredentialProvider};
use tracing::info;

/// Create the application state from configuration
///
/// Credentials are read from the environment when a backend is created, so
/// a missing key only fails requests for that provider.
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let credentials = Arc::new(EnvCredentialProvider::default());
    let factory = ChatBackendFactory::new(credentials, config.providers.clone())?;

    info!(
        providers = ?ChatBackendFactory::supported_providers(),
        timeout_secs = ?config.providers.timeout_secs,
        "Chat backends configured"
    );

    Ok(AppState::new(Arc::new(factory)))
}
