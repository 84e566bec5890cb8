use std::fmt;

use crate::domain::chat::ProviderKind;

/// API key for one provider
#[derive(Clone)]
pub struct Credential {
    provider: ProviderKind,
    api_key: String,
    organization: Option<String>,
}

impl Credential {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            organization: None,
        }
    }

    /// Account scope sent alongside the key (OpenAI only)
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("organization", &self.organization)
            .finish()
    }
}
