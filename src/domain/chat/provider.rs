use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Choice-based chat completions
    OpenAi,
    /// Message completions with content blocks
    Anthropic,
    /// Turn-based chat with a single text field
    Cohere,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Anthropic, Self::Cohere];

    /// Canonical identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Cohere => "cohere",
        }
    }

    /// Every identifier accepted for this provider, canonical first
    pub fn identifiers(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["openai", "openai-style"],
            Self::Anthropic => &["anthropic", "anthropic-style"],
            Self::Cohere => &["cohere", "cohere-style"],
        }
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    /// Exact, case-sensitive match against the supported identifiers
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "openai" | "openai-style" => Ok(Self::OpenAi),
            "anthropic" | "anthropic-style" => Ok(Self::Anthropic),
            "cohere" | "cohere-style" => Ok(Self::Cohere),
            other => Err(DomainError::unsupported_provider(other)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
