//! Incremental splitter for `text/event-stream` bodies.
//!
//! Used only by the native transport. Bytes arrive in arbitrary chunks;
//! [`EventParser::feed`] buffers them and returns every event whose
//! terminating blank line has been seen.
//!
//! Recognised fields are `event:` and `data:` (multiple `data:` lines are
//! joined with `\n`). Comment lines (leading `:`), `id:` and `retry:` are
//! ignored. Lines may end in `\n` or `\r\n`. An event containing a line that
//! is not valid UTF-8 is reported as a [`TreeError::Decode`] in its place.
//!
//! ```
//! use firetree::client::EventParser;
//!
//! let mut parser = EventParser::new();
//! assert!(parser.feed(b"event: put\ndata: {\"path\":\"/\",").is_empty());
//! let events = parser.feed(b"\"data\":1}\n\n");
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].as_ref().unwrap().event, "put");
//! ```

use crate::core::error::{Result, TreeError};
use crate::core::types::ServerEvent;
use bytes::{Buf, BytesMut};

#[derive(Debug, Default)]
pub struct EventParser {
    buffer: BytesMut,
    /// Bytes of `buffer` already known to hold no line break.
    scanned: usize,
    event: Option<String>,
    data: Vec<String>,
    malformed: bool,
}

impl EventParser {
    pub fn new() -> Self {
        EventParser {
            buffer: BytesMut::with_capacity(4096),
            ..Default::default()
        }
    }

    /// Feed a chunk and collect the events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<ServerEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let raw = self.buffer.split_to(self.scanned + offset);
            self.buffer.advance(1);
            self.scanned = 0;

            let completed = match std::str::from_utf8(&raw) {
                Ok(line) => self.take_line(line.strip_suffix('\r').unwrap_or(line)),
                Err(_) => {
                    self.malformed = true;
                    None
                }
            };
            if let Some(event) = completed {
                events.push(event);
            }
        }
        self.scanned = self.buffer.len();
        events
    }

    fn take_line(&mut self, line: &str) -> Option<Result<ServerEvent>> {
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
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Result<ServerEvent>> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if std::mem::take(&mut self.malformed) {
            return Some(Err(TreeError::Decode(format!(
                "event {} is not valid UTF-8",
                event.as_deref().unwrap_or("message")
            ))));
        }
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(Ok(ServerEvent::new(
            event.unwrap_or_else(|| "message".to_string()),
            data.join("\n"),
        )))
    }
}
