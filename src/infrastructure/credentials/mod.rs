//! Credential sources

mod env_provider;
mod static_provider;

pub use env_provider::{EnvCredentialProvider, EnvVars};
pub use static_provider::StaticCredentialProvider;
