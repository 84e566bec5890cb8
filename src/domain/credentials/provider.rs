use async_trait::async_trait;
use std::fmt::Debug;

use super::Credential;
use crate::domain::{DomainError, ProviderKind};

/// Where backends get their API keys from
#[async_trait]
pub trait CredentialProvider: Send + Sync + Debug {
    /// Fails with [`DomainError::Credential`] when no key is available
    async fn credential_for(&self, provider: ProviderKind) -> Result<Credential, DomainError>;

    /// Short name of the source, for logs
    fn source(&self) -> &'static str;
}
