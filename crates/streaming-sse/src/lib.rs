//! # Server-Sent Events (SSE) decoding
//!
//! Transport-agnostic, incremental decoding of `text/event-stream` bodies.
//! Feed raw byte chunks with [`SseDecoder::push`] as they arrive; complete
//! events come out in order regardless of how the bytes were split.

use bytes::Bytes;
use std::collections::VecDeque;

/// Sentinel payload vendors send to mark the end of a completion stream.
pub const DONE_SENTINEL: &[u8] = b"[DONE]";

/// A single dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type (optional)
    pub event: Option<String>,
    /// Event data payload; multiple `data:` lines are joined with `\n`
    pub data: Bytes,
    /// Event ID (optional)
    pub id: Option<String>,
    /// Reconnection time in milliseconds (optional)
    pub retry: Option<u64>,
}

impl SseEvent {
    pub fn data(data: impl Into<Bytes>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    /// True for the `[DONE]` end-of-stream marker.
    pub fn is_done(&self) -> bool {
        self.data.as_ref() == DONE_SENTINEL
    }
}

/// Incremental line-oriented SSE decoder.
#[derive(Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line(s)
    buffer: Vec<u8>,
    pending: PendingEvent,
    ready: VecDeque<SseEvent>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes and drain every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> impl Iterator<Item = SseEvent> + '_ {
        self.buffer.extend_from_slice(chunk);
        while let Some((line_end, consumed)) = next_line(&self.buffer) {
            let line: Vec<u8> = self.buffer[..line_end].to_vec();
            self.buffer.drain(..consumed);
            self.feed_line(&line);
        }
        self.ready.drain(..)
    }

    /// Flush at end of input.
    ///
    /// Some servers close the connection right after the last `data:` line
    /// without the blank line that dispatches it; that event is emitted here.
    pub fn finish(&mut self) -> impl Iterator<Item = SseEvent> + '_ {
        if !self.buffer.is_empty() {
            let mut line = std::mem::take(&mut self.buffer);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.feed_line(&line);
        }
        self.dispatch();
        self.ready.drain(..)
    }

    fn feed_line(&mut self, line: &[u8]) {
        if line.is_empty() {
            self.dispatch();
            return;
        }
        if line[0] == b':' {
            return;
        }
        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };
        match field {
            "data" => self.pending.data.push(value.to_string()),
            "event" => self.pending.event = Some(value.to_string()),
            "id" => self.pending.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.pending.retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if let Some(event) = pending.build() {
            self.ready.push_back(event);
        }
    }
}

#[derive(Default)]
struct PendingEvent {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl PendingEvent {
    /// Events without any `data:` line are discarded.
    fn build(self) -> Option<SseEvent> {
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: self.event,
            data: Bytes::from(self.data.join("\n")),
            id: self.id,
            retry: self.retry,
        })
    }
}

/// Locate the first complete line. Returns (end of line content, bytes consumed).
/// A trailing `\r` is held back until we know whether `\n` follows.
fn next_line(buf: &[u8]) -> Option<(usize, usize)> {
    let pos = buf.iter().position(|b| *b == b'\n' || *b == b'\r')?;
    if buf[pos] == b'\n' {
        return Some((pos, pos + 1));
    }
    match buf.get(pos + 1) {
        Some(b'\n') => Some((pos, pos + 2)),
        Some(_) => Some((pos, pos + 1)),
        None => None,
    }
}

#[cfg(test)]
#[path = "../tests/decoder_tests.rs"]
mod decoder_tests;
