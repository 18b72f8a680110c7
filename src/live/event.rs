//! Event Stream Decoding
//!
//! Incremental parser for `text/event-stream` bodies and the typed events
//! the live client reacts to.

use serde::Serialize;
use tracing::warn;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Longest line buffered before it is discarded
const MAX_LINE_LEN: usize = 64 * 1024;

/// One dispatched event-stream frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SseFrame {
    /// Event name, `message` when the frame had no `event:` field
    pub event: String,
    /// Data lines joined with `\n`
    pub data: String,
    /// Last event id seen on the stream at dispatch time
    pub id: Option<String>,
    /// Reconnection hint in milliseconds, if the frame carried one
    pub retry: Option<u64>,
}

/// Events the live client distinguishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// Sent by the server once per connection
    Init,
    /// New items are available
    Update { data: String, id: Option<String> },
    /// `ping` or `keepalive`
    Keepalive,
    /// Anything else
    Other { event: String, data: String },
}

impl From<SseFrame> for LiveEvent {
    fn from(frame: SseFrame) -> Self {
        match frame.event.as_str() {
            "init" => LiveEvent::Init,
            "update" => LiveEvent::Update {
                data: frame.data,
                id: frame.id,
            },
            "ping" | "keepalive" => LiveEvent::Keepalive,
            _ => LiveEvent::Other {
                event: frame.event,
                data: frame.data,
            },
        }
    }
}

/// Incremental `text/event-stream` decoder
///
/// Bytes may arrive split at any point, including inside a CRLF pair or a
/// multi-byte character; nothing is emitted until a full line is buffered.
/// A line longer than 64 KiB is dropped up to its terminator.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    skip_lf: bool,
    discarding: bool,
    started: bool,
    event: String,
    data: String,
    last_id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    /// Create a decoder at the start of a stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder that resumes after `last_event_id`, as on reconnect
    pub fn resume(last_event_id: Option<String>) -> Self {
        Self {
            last_id: last_event_id,
            ..Self::default()
        }
    }

    /// Last event id seen, persisted across frames
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Feed a chunk of the body, returning every frame it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();

        for &byte in chunk {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut frames),
                b'\r' => {
                    self.skip_lf = true;
                    self.end_line(&mut frames);
                }
                _ if self.discarding => {}
                _ if self.line.len() >= MAX_LINE_LEN => {
                    warn!(limit = MAX_LINE_LEN, "Event stream line too long, discarding");
                    self.line = Vec::new();
                    self.discarding = true;
                    self.started = true;
                }
                _ => self.line.push(byte),
            }
        }

        frames
    }

    fn end_line(&mut self, frames: &mut Vec<SseFrame>) {
        // The tail of an oversized line is not a blank line
        if self.discarding {
            self.discarding = false;
            return;
        }

        let raw = std::mem::take(&mut self.line);
        let mut bytes = raw.as_slice();

        if !self.started {
            self.started = true;
            if let Some(rest) = bytes.strip_prefix(BOM) {
                bytes = rest;
            }
        }

        if bytes.is_empty() {
            if let Some(frame) = self.dispatch() {
                frames.push(frame);
            }
            return;
        }

        // Comment
        if bytes[0] == b':' {
            return;
        }

        let line = String::from_utf8_lossy(bytes);
        let (field, value) = match line.find(':') {
            Some(pos) => {
                let value = &line[pos + 1..];
                (&line[..pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (&line[..], ""),
        };

        match field {
            "event" => self.event = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.retry = value.parse().ok();
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = std::mem::take(&mut self.event);
        let retry = self.retry.take();

        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop();

        Some(SseFrame {
            event: if event.is_empty() {
                "message".to_string()
            } else {
                event
            },
            data,
            id: self.last_event_id().map(str::to_string),
            retry,
        })
    }
}
