use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    #[error("Upstream error: {provider} - {message}")]
    Upstream { provider: String, message: String },

    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Re-tag an upstream error with the provider that issued the call.
    ///
    /// The HTTP client reports failures as coming from `http`; backends call
    /// this so callers see which provider failed.
    pub fn for_provider(self, provider: &str) -> Self {
        match self {
            Self::Upstream { message, .. } => Self::upstream(provider, message),
            other => other,
        }
    }
}
