use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::http_client::{HttpClient, HttpClientTrait};
use super::{AnthropicBackend, CohereBackend, OpenAiBackend};
use crate::config::{BackendSettings, ProvidersConfig};
use crate::domain::{ChatBackend, Credential, CredentialProvider, DomainError, ProviderKind};

/// Maps provider identifiers to freshly constructed chat backends
///
/// Holds only configuration and the credential source; every call to
/// [`create`](Self::create) builds a new backend.
#[derive(Debug, Clone)]
pub struct ChatBackendFactory {
    credentials: Arc<dyn CredentialProvider>,
    settings: ProvidersConfig,
    http_client: HttpClient,
}

impl ChatBackendFactory {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        settings: ProvidersConfig,
    ) -> Result<Self, DomainError> {
        let http_client = match settings.timeout_secs {
            Some(secs) => HttpClient::with_timeout(Duration::from_secs(secs))?,
            None => HttpClient::new(),
        };

        Ok(Self {
            credentials,
            settings,
            http_client,
        })
    }

    /// Create the backend registered under `name`.
    ///
    /// Unknown names fail with [`DomainError::UnsupportedProvider`] before
    /// any credential lookup happens.
    pub async fn create(&self, name: &str) -> Result<Arc<dyn ChatBackend>, DomainError> {
        let kind: ProviderKind = name.parse()?;

        let credential = self.credentials.credential_for(kind).await?;

        debug!(
            provider = %kind,
            credential_source = self.credentials.source(),
            "Creating chat backend"
        );

        Ok(Self::build(
            kind,
            &credential,
            self.settings.for_provider(kind),
            self.http_client.clone(),
        ))
    }

    /// Build a backend for `kind` over the given HTTP client
    pub fn build<C: HttpClientTrait + 'static>(
        kind: ProviderKind,
        credential: &Credential,
        settings: &BackendSettings,
        client: C,
    ) -> Arc<dyn ChatBackend> {
        match kind {
            ProviderKind::OpenAi => {
                let mut backend = match settings.base_url {
                    Some(ref url) => OpenAiBackend::with_base_url(client, credential.api_key(), url),
                    None => OpenAiBackend::new(client, credential.api_key()),
                };

                if let Some(ref model) = settings.default_model {
                    backend = backend.with_default_model(model);
                }

                if let Some(organization) = credential.organization() {
                    backend = backend.with_organization(organization);
                }

                Arc::new(backend)
            }

            ProviderKind::Anthropic => {
                let mut backend = match settings.base_url {
                    Some(ref url) => {
                        AnthropicBackend::with_base_url(client, credential.api_key(), url)
                    }
                    None => AnthropicBackend::new(client, credential.api_key()),
                };

                if let Some(ref model) = settings.default_model {
                    backend = backend.with_default_model(model);
                }

                Arc::new(backend)
            }

            ProviderKind::Cohere => {
                let mut backend = match settings.base_url {
                    Some(ref url) => CohereBackend::with_base_url(client, credential.api_key(), url),
                    None => CohereBackend::new(client, credential.api_key()),
                };

                if let Some(ref model) = settings.default_model {
                    backend = backend.with_default_model(model);
                }

                Arc::new(backend)
            }
        }
    }

    /// Every identifier [`create`](Self::create) accepts
    pub fn supported_providers() -> Vec<&'static str> {
        ProviderKind::ALL
            .iter()
            .flat_map(|kind| kind.identifiers().iter().copied())
            .collect()
    }
}
