//! Infrastructure layer - provider backends, credential sources and logging

pub mod credentials;
pub mod llm;
pub mod logging;

pub use credentials::{EnvCredentialProvider, StaticCredentialProvider};
pub use llm::{ChatBackendFactory, HttpClient, HttpClientTrait};
