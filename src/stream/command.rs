//! Command phase reader, used on the gateway side of a connection.

use std::mem;

use tracing::debug;

use crate::protocol::command::{parse_command_line, AgiCommand, CommandParse};
use crate::protocol::line_buffer::{trim_cr, LineBuffer};
use crate::stream::Event;
use crate::Result;

/// Incremental reader for command lines.
///
/// A `HANGUP` command is emitted as [`Event::Command`] followed by
/// [`Event::EndOfStream`]; the reader then ignores further input until
/// [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct CommandReader {
    lines: LineBuffer,
    carried: Vec<Event>,
    finished: bool,
}

impl CommandReader {
    /// Create an idle reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject command lines longer than `max` bytes.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.lines = LineBuffer::with_max_length(max);
        self
    }

    /// Feed the next chunk and return every event it completes, in order.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when a line exceeds the byte limit. Events
    /// completed before the oversized line are returned by the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Event>> {
        let mut events = mem::take(&mut self.carried);
        if self.finished {
            return Ok(events);
        }

        self.lines.extend(chunk);
        loop {
            let line = match self.lines.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    self.carried = events;
                    return Err(err);
                }
            };
            events.extend(self.push_line(&line));
            if self.finished {
                self.lines.reset();
                break;
            }
        }
        Ok(events)
    }

    /// Consume one complete line, without its newline.
    pub fn push_line(&mut self, line: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        if self.finished || trim_cr(line).iter().all(u8::is_ascii_whitespace) {
            return events;
        }

        match parse_command_line(line) {
            CommandParse::Complete(message) => {
                let hangup = message.command() == AgiCommand::Hangup;
                debug!(command = %message.command(), args = message.args().len(), "command reader: command parsed");
                events.push(Event::Command(message));
                if hangup {
                    self.finished = true;
                    events.push(Event::EndOfStream);
                }
            }
            CommandParse::Unrecognized(diagnostic) => {
                diagnostic.log("command reader");
                events.push(Event::Diagnostic(diagnostic));
            }
        }
        events
    }

    /// Whether a `HANGUP` command has been seen.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes buffered but not yet assigned to a line.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.lines.len()
    }

    /// Discard partial input and clear the finished state.
    pub fn reset(&mut self) {
        self.lines.reset();
        self.carried.clear();
        self.finished = false;
    }
}
