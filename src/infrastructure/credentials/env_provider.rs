use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{Credential, CredentialProvider, DomainError, ProviderKind};

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Names of the variables holding one provider's credential
#[derive(Debug, Clone)]
pub struct EnvVars {
    pub api_key: String,
    pub organization: Option<String>,
}

impl EnvVars {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, var: impl Into<String>) -> Self {
        self.organization = Some(var.into());
        self
    }
}

/// Reads API keys from environment variables when a backend is created
///
/// Defaults: `OPENAI_API_KEY` (+ `OPENAI_ORGANIZATION`), `ANTHROPIC_API_KEY`,
/// `COHERE_API_KEY`. Empty values count as unset.
#[derive(Clone)]
pub struct EnvCredentialProvider {
    vars: HashMap<ProviderKind, EnvVars>,
    lookup: Lookup,
}

impl EnvCredentialProvider {
    pub fn new() -> Self {
        let vars = HashMap::from([
            (
                ProviderKind::OpenAi,
                EnvVars::new("OPENAI_API_KEY").with_organization("OPENAI_ORGANIZATION"),
            ),
            (ProviderKind::Anthropic, EnvVars::new("ANTHROPIC_API_KEY")),
            (ProviderKind::Cohere, EnvVars::new("COHERE_API_KEY")),
        ]);

        Self {
            vars,
            lookup: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    pub fn with_vars(mut self, provider: ProviderKind, vars: EnvVars) -> Self {
        self.vars.insert(provider, vars);
        self
    }

    /// Replace the process environment as the variable source
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    fn read(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.is_empty())
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentialProvider")
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn credential_for(&self, provider: ProviderKind) -> Result<Credential, DomainError> {
        let vars = self.vars.get(&provider).ok_or_else(|| {
            DomainError::credential(format!("No environment variables configured for {}", provider))
        })?;

        let api_key = self.read(&vars.api_key).ok_or_else(|| {
            DomainError::credential(format!(
                "Environment variable '{}' not set for {}",
                vars.api_key, provider
            ))
        })?;

        let mut credential = Credential::new(provider, api_key);

        if let Some(organization) = vars.organization.as_deref().and_then(|var| self.read(var)) {
            credential = credential.with_organization(organization);
        }

        Ok(credential)
    }

    fn source(&self) -> &'static str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with(vars: &[(&'static str, &'static str)]) -> EnvCredentialProvider {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        EnvCredentialProvider::new().with_lookup(move |name| vars.get(name).map(|v| v.to_string()))
    }

    #[tokio::test]
    async fn test_default_variable_names() {
        let provider = provider_with(&[
            ("OPENAI_API_KEY", "sk-key"),
            ("OPENAI_ORGANIZATION", "org-42"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("COHERE_API_KEY", "co-key"),
        ]);

        let openai = provider.credential_for(ProviderKind::OpenAi).await.unwrap();
        assert_eq!(openai.api_key(), "sk-key");
        assert_eq!(openai.organization(), Some("org-42"));

        let anthropic = provider.credential_for(ProviderKind::Anthropic).await.unwrap();
        assert_eq!(anthropic.api_key(), "sk-ant");
        assert_eq!(anthropic.organization(), None);

        let cohere = provider.credential_for(ProviderKind::Cohere).await.unwrap();
        assert_eq!(cohere.provider(), ProviderKind::Cohere);
    }

    #[tokio::test]
    async fn test_missing_variable() {
        let provider = provider_with(&[("OPENAI_API_KEY", "sk-key")]);

        let err = provider.credential_for(ProviderKind::Cohere).await.unwrap_err();
        assert!(matches!(err, DomainError::Credential { ref message } if message.contains("COHERE_API_KEY")));
    }

    #[tokio::test]
    async fn test_empty_variable_counts_as_unset() {
        let provider = provider_with(&[("ANTHROPIC_API_KEY", "")]);

        assert!(provider.credential_for(ProviderKind::Anthropic).await.is_err());
    }

    #[tokio::test]
    async fn test_custom_variable_names() {
        let provider = provider_with(&[("GATEWAY_COHERE_KEY", "co-custom")])
            .with_vars(ProviderKind::Cohere, EnvVars::new("GATEWAY_COHERE_KEY"));

        let cred = provider.credential_for(ProviderKind::Cohere).await.unwrap();
        assert_eq!(cred.api_key(), "co-custom");
    }

    #[test]
    fn test_debug_omits_lookup() {
        let debug = format!("{:?}", EnvCredentialProvider::new());
        assert!(debug.contains("COHERE_API_KEY"));
    }
}
