//! Chat domain: the uniform backend contract and its data model

mod backend;
mod message;
mod normalizer;
mod options;
mod provider;
mod response;

pub use backend::ChatBackend;
pub use message::{ChatRole, ChatTurn};
pub use normalizer::{NON_TEXT_RESPONSE, ResponseNormalizer, normalize_stream};
pub use options::SendOptions;
pub(crate) use options::merge_extra;
pub use provider::ProviderKind;
pub use response::{ChatResponse, FragmentStream};

#[cfg(test)]
pub use backend::mock::MockChatBackend;
