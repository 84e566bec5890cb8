//! Framing for streamed provider responses
//!
//! Providers deliver streams either as Server-Sent Events (`event:` /
//! `data:` lines separated by blank lines) or as newline-delimited JSON.
//! Network chunks do not respect line boundaries, so both decoders buffer
//! partial lines until the terminating newline arrives. Decoding is driven
//! by the consumer: the byte stream is only polled when a record is pulled.

use std::collections::VecDeque;
use std::future;
use std::pin::Pin;

use futures::{Stream, StreamExt, stream};
use serde::de::DeserializeOwned;

use super::http_client::ByteStream;
use crate::domain::DomainError;

/// Stream of decoded records
pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<T, DomainError>> + Send>>;

/// One Server-Sent Event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

struct LineState {
    inner: ByteStream,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    // Last terminator was `\r`; a following `\n` belongs to it
    after_cr: bool,
    failure: Option<DomainError>,
    finished: bool,
}

impl LineState {
    fn push(&mut self, chunk: &[u8]) -> Result<(), DomainError> {
        for &byte in chunk {
            let after_cr = std::mem::replace(&mut self.after_cr, false);

            match byte {
                b'\n' if after_cr => {}
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.buffer);
                    self.pending.push_back(decode_line(line)?);
                }
                _ => self.buffer.push(byte),
            }
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<(), DomainError> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.pending.push_back(decode_line(rest)?);
        }

        Ok(())
    }

    fn fail(&mut self, err: DomainError) {
        self.finished = true;
        self.buffer.clear();
        self.failure = Some(err);
    }
}

fn decode_line(raw: Vec<u8>) -> Result<String, DomainError> {
    String::from_utf8(raw).map_err(|e| {
        DomainError::upstream("http", format!("Stream line is not valid UTF-8: {}", e))
    })
}

/// Split a byte stream into lines (without terminators).
///
/// `\n`, `\r\n` and a lone `\r` all end a line. A trailing line without a
/// terminator is emitted when the stream ends. An upstream error or a line
/// that is not UTF-8 is yielded once, after the lines before it, and ends
/// the stream.
pub fn lines(bytes: ByteStream) -> RecordStream<String> {
    let state = LineState {
        inner: bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        after_cr: false,
        failure: None,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }

            if let Some(err) = state.failure.take() {
                return Some((Err(err), state));
            }

            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    if let Err(e) = state.push(&chunk) {
                        state.fail(e);
                    }
                }
                Some(Err(e)) => state.fail(e),
                None => {
                    state.finished = true;
                    if let Err(e) = state.flush() {
                        state.fail(e);
                    }
                }
            }
        }
    }))
}

/// Non-blank lines of a newline-delimited JSON stream
pub fn json_lines(bytes: ByteStream) -> RecordStream<String> {
    Box::pin(lines(bytes).filter(|item| {
        future::ready(!matches!(item, Ok(line) if line.trim().is_empty()))
    }))
}

struct SseState {
    lines: RecordStream<String>,
    event: Option<String>,
    data: Vec<String>,
    finished: bool,
}

impl SseState {
    fn apply(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry carry nothing we act on
            _ => {}
        }
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        let event = self.event.take();

        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Decode a Server-Sent Events stream.
///
/// Events without any `data:` line are dropped. An event still open when
/// the stream ends is dispatched.
pub fn sse_events(bytes: ByteStream) -> RecordStream<SseEvent> {
    let state = SseState {
        lines: lines(bytes),
        event: None,
        data: Vec::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.lines.next().await {
                Some(Ok(line)) if line.is_empty() => {
                    if let Some(event) = state.take_event() {
                        return Some((Ok(event), state));
                    }
                }
                Some(Ok(line)) => state.apply(&line),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    return state.take_event().map(|event| (Ok(event), state));
                }
            }
        }
    }))
}

/// Parse one JSON payload from a stream into a typed event
pub fn decode_json<T: DeserializeOwned>(provider: &str, payload: &str) -> Result<T, DomainError> {
    serde_json::from_str(payload).map_err(|e| {
        DomainError::upstream(provider, format!("Failed to parse stream event: {}", e))
    })
}
