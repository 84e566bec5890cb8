use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::{Credential, CredentialProvider, DomainError, ProviderKind};

/// Fixed set of credentials supplied up front
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<ProviderKind, Credential>,
}

impl StaticCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credentials.insert(credential.provider(), credential);
        self
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credential_for(&self, provider: ProviderKind) -> Result<Credential, DomainError> {
        self.credentials
            .get(&provider)
            .cloned()
            .ok_or_else(|| DomainError::credential(format!("No credential for {}", provider)))
    }

    fn source(&self) -> &'static str {
        "static"
    }
}
