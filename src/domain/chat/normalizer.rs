use futures::{Stream, StreamExt};

use super::FragmentStream;
use crate::domain::DomainError;

/// Text returned in place of content that is not plain text
/// (images, tool calls, non-assistant messages).
pub const NON_TEXT_RESPONSE: &str = "Non-text response received.";

/// Maps one provider's raw response shapes onto plain text
///
/// Implementations are pure: no I/O, no state. Every response or event
/// yields a string, possibly empty, and never fails. Content that exists
/// but is not text yields [`NON_TEXT_RESPONSE`].
pub trait ResponseNormalizer {
    /// Complete (non-streaming) response object
    type Response;
    /// One item of the provider's event stream
    type Event;

    fn normalize_response(response: &Self::Response) -> String;

    fn normalize_event(event: &Self::Event) -> String;
}

/// Wrap a stream of raw provider events into a fragment stream.
///
/// Normalization happens as items are pulled; nothing is read ahead.
pub fn normalize_stream<N, S>(events: S) -> FragmentStream
where
    N: ResponseNormalizer + 'static,
    S: Stream<Item = Result<N::Event, DomainError>> + Send + 'static,
{
    Box::pin(events.map(|item| item.map(|event| N::normalize_event(&event))))
}
