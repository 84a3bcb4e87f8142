// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental `text/event-stream` decoder.
//!
//! Chunks may split lines (and UTF-8 sequences) anywhere; bytes are buffered
//! until a full line is available. A blank line dispatches the accumulated
//! event. `retry:` fields are ignored since reconnect pacing is local.
//!
//! The last event id survives dispatch and [`SseDecoder::reset`] so a
//! reconnect can resume with `Last-Event-ID`.

use bytes::{Buf, BytesMut};

/// Longest line buffered before the decoder gives up on it.
pub const DEFAULT_MAX_LINE: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

#[derive(Debug)]
pub struct SseDecoder {
    buf: BytesMut,
    max_line: usize,
    /// Skipping the tail of an oversized line.
    overflowed: bool,
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_line,
            overflowed: false,
            event: None,
            id: None,
            data: Vec::new(),
        }
    }

    /// Id of the most recent `id:` field seen, if any.
    pub fn last_event_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Feed a chunk and return every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos);
            self.buf.advance(1);
            if std::mem::take(&mut self.overflowed) {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        if self.buf.len() > self.max_line {
            tracing::warn!(len = self.buf.len(), "discarding oversized event stream line");
            self.buf.clear();
            self.overflowed = true;
            self.event = None;
            self.data.clear();
        }
        frames
    }

    /// Drop any partially received event, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
        self.event = None;
        self.data.clear();
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_owned()),
            "event" => self.event = Some(value.to_owned()),
            "id" if !value.contains('\0') => self.id = Some(value.to_owned()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, id: self.id.clone(), data })
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
