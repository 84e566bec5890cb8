//! Domain layer - the chat contract, provider identities and credentials

pub mod chat;
pub mod credentials;
pub mod error;

pub use chat::{
    ChatBackend, ChatResponse, ChatRole, ChatTurn, FragmentStream, NON_TEXT_RESPONSE,
    ProviderKind, ResponseNormalizer, SendOptions, normalize_stream,
};
pub use credentials::{Credential, CredentialProvider};
pub use error::DomainError;
