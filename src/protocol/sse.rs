// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server-sent events framing.
//!
//! Only the `data` field matters to the push channel. Consecutive `data:`
//! lines are joined with `\n` and emitted when a blank line ends the event.
//! Comment lines (leading `:`) and every other field (`event`, `id`,
//! `retry`) are ignored. Lines may end in `\n` or `\r\n`, and a line may
//! be split across any number of chunks. An event left unterminated when
//! the body ends is discarded.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream, StreamExt};

use crate::error::ProtocolError;

/// Largest event, in bytes, the decoder buffers by default.
pub const DEFAULT_MAX_EVENT_SIZE: usize = 1024 * 1024;

/// Incremental decoder for a `text/event-stream` body.
///
/// Memory is bounded: an event whose lines grow past the size limit is
/// dropped whole, and decoding resumes with the next event.
#[derive(Debug)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: String,
    has_data: bool,
    max_event_size: usize,
    skipping_line: bool,
    dropping_event: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    /// Creates an empty decoder with the default size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_event_size(DEFAULT_MAX_EVENT_SIZE)
    }

    /// Creates an empty decoder that drops events larger than
    /// `max_event_size` bytes.
    #[must_use]
    pub fn with_max_event_size(max_event_size: usize) -> Self {
        Self {
            line: Vec::new(),
            data: String::new(),
            has_data: false,
            max_event_size,
            skipping_line: false,
            dropping_event: false,
        }
    }

    /// Feeds a chunk of the body and returns the data of every event it
    /// completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut completed = Vec::new();
        for &byte in chunk {
            if byte != b'\n' {
                if !self.skipping_line {
                    self.line.push(byte);
                    if self.line.len() + self.data.len() > self.max_event_size {
                        self.overflow();
                    }
                }
                continue;
            }
            if self.skipping_line {
                self.skipping_line = false;
                continue;
            }
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
            let line = std::mem::take(&mut self.line);
            if let Some(data) = self.process_line(&String::from_utf8_lossy(&line)) {
                completed.push(data);
            }
        }
        completed
    }

    fn overflow(&mut self) {
        if !self.dropping_event {
            tracing::warn!(limit = self.max_event_size, "Dropping oversized push event");
        }
        self.line.clear();
        self.data.clear();
        self.has_data = false;
        self.skipping_line = true;
        self.dropping_event = true;
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') || self.dropping_event {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            if self.has_data {
                self.data.push('\n');
            }
            self.data.push_str(value);
            self.has_data = true;
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.dropping_event {
            self.dropping_event = false;
            return None;
        }
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(std::mem::take(&mut self.data))
    }
}

/// Turns a byte stream into a stream of event data payloads.
///
/// A transport error is yielded once and ends the stream.
pub fn decode<S, B, E>(body: S) -> impl Stream<Item = Result<String, ProtocolError>> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ProtocolError> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        failed: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.ready.pop_front() {
                return Some((Ok(data), state));
            }
            if state.failed {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let completed = state.decoder.feed(chunk.as_ref());
                    state.ready.extend(completed);
                }
                Some(Err(e)) => {
                    state.failed = true;
                    return Some((Err(e.into()), state));
                }
                None => return None,
            }
        }
    })
}

struct DecodeState<S> {
    body: std::pin::Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_event() {
        let mut decoder = SseDecoder::new();
        assert_eq!(
            decoder.feed(b"data: {\"status\":\"connected\"}\n\n"),
            vec![r#"{"status":"connected"}"#.to_string()]
        );
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data: a\ndata: b\n\n"), vec!["a\nb".to_string()]);
    }

    #[test]
    fn ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b": keep-alive\n\nevent: message\nid: 7\nretry: 100\ndata:x\n\n");
        assert_eq!(out, vec!["x".to_string()]);
    }

    #[test]
    fn tolerates_crlf() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data: x\r\n\r\n"), vec!["x".to_string()]);
    }

    #[test]
    fn buffers_partial_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"da").is_empty());
        assert!(decoder.feed(b"ta: {\"a\"").is_empty());
        assert!(decoder.feed(b":1}\n").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec![r#"{"a":1}"#.to_string()]);
    }

    #[test]
    fn blank_lines_without_data_emit_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn oversized_line_drops_only_its_event() {
        let mut decoder = SseDecoder::with_max_event_size(16);
        assert!(decoder.feed(b"data: 0123456789").is_empty());
        // The line keeps growing without a newline.
        assert!(decoder.feed(&[b'x'; 4096]).is_empty());
        assert!(decoder.feed(b"\ndata: tail\n\n").is_empty());
        assert!(decoder.line.is_empty());
        assert_eq!(decoder.feed(b"data: ok\n\n"), vec!["ok".to_string()]);
    }

    #[test]
    fn oversized_multi_line_event_is_dropped() {
        let mut decoder = SseDecoder::with_max_event_size(16);
        assert!(decoder.feed(b"data: 0123456\ndata: 0123456\n\n").is_empty());
        assert_eq!(decoder.feed(b"data: small\n\n"), vec!["small".to_string()]);
    }

    #[tokio::test]
    async fn decode_stream_ends_after_error() {
        let chunks: Vec<Result<&'static [u8], ProtocolError>> = vec![
            Ok(b"data: 1\n\ndata: 2\n".as_slice()),
            Ok(b"\n".as_slice()),
            Err(ProtocolError::ConnectionFailed("reset".to_string())),
            Ok(b"data: 3\n\n".as_slice()),
        ];
        let items: Vec<_> = decode(stream::iter(chunks)).collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), "1");
        assert_eq!(items[1].as_ref().unwrap(), "2");
        assert!(matches!(items[2], Err(ProtocolError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn unterminated_event_is_discarded() {
        let chunks: Vec<Result<&'static [u8], ProtocolError>> =
            vec![Ok(b"data: 1\n\ndata: partial".as_slice())];
        let items: Vec<_> = decode(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 1);
    }
}
