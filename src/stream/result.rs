//! Result phase reader.
//!
//! Feeds complete lines through [`parse_result_blob`], carrying an
//! unterminated `520` usage block across lines and across `feed` calls.
//!
//! | Line while idle            | Outcome                                   |
//! |----------------------------|-------------------------------------------|
//! | blank                      | skipped; logged at `DEBUG`                |
//! | contains `HANGUP`          | [`Event::EndOfStream`]; reader finishes   |
//! | no status code             | [`Event::Diagnostic`] (warning)           |
//! | `520-…` without terminator | buffered as a pending usage block         |
//! | any other status line      | [`Event::Result`] (+ diagnostic if any)   |
//!
//! While a usage block is pending, only a line consisting of `HANGUP` ends
//! the stream, since usage text may name the `HANGUP` command. A line
//! beginning with a status code other than `520` abandons the block with a
//! warning and is parsed fresh. A block outgrowing the byte limit is
//! dropped with a warning.

use std::mem;

use tracing::debug;

use crate::protocol::line_buffer::{trim_cr, LineBuffer};
use crate::protocol::result::{
    leading_status, parse_result_blob, parse_status_blob, ResultParse, HANGUP_MARKER,
};
use crate::protocol::status::AgiStatus;
use crate::protocol::Diagnostic;
use crate::stream::Event;
use crate::Result;

/// Incremental reader for result lines.
#[derive(Debug)]
pub struct ResultReader {
    lines: LineBuffer,
    pending: Option<String>,
    max_pending_bytes: usize,
    carried: Vec<Event>,
    finished: bool,
}

impl Default for ResultReader {
    fn default() -> Self {
        Self {
            lines: LineBuffer::new(),
            pending: None,
            max_pending_bytes: usize::MAX,
            carried: Vec::new(),
            finished: false,
        }
    }
}

impl ResultReader {
    /// Create an idle reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound single lines and pending usage blocks to `max` bytes.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.lines = LineBuffer::with_max_length(max);
        self.max_pending_bytes = max;
        self
    }

    /// Feed the next chunk and return every event it completes, in order.
    ///
    /// After [`Event::EndOfStream`] the reader is finished and ignores
    /// further input until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when a line exceeds the byte limit. Events
    /// completed before the oversized line are returned by the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Event>> {
        let mut events = mem::take(&mut self.carried);
        if self.finished {
            if !chunk.is_empty() {
                debug!(bytes = chunk.len(), "result reader: input after hangup discarded");
            }
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

    /// Queue `event` ahead of the events returned by the next `feed`.
    pub(crate) fn defer(&mut self, event: Event) {
        self.carried.push(event);
    }

    /// Consume one complete line, without its newline.
    pub fn push_line(&mut self, line: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        let line = String::from_utf8_lossy(trim_cr(line)).into_owned();
        self.process_line(line, &mut events);
        events
    }

    fn process_line(&mut self, line: String, events: &mut Vec<Event>) {
        let (blob, continued) = match self.pending.take() {
            Some(mut blob) => {
                if line.trim() == HANGUP_MARKER {
                    self.finish(events);
                    return;
                }
                match leading_status(&line).map(AgiStatus::from_code) {
                    Some(status) if status != AgiStatus::InvalidCommandSyntax => {
                        push_diagnostic(
                            events,
                            Diagnostic::warning("usage block interrupted by a new status line", blob),
                        );
                        (line, false)
                    }
                    _ => {
                        blob.push('\n');
                        blob.push_str(&line);
                        if blob.len() > self.max_pending_bytes {
                            push_diagnostic(
                                events,
                                Diagnostic::warning("usage block too long, dropped", blob),
                            );
                            return;
                        }
                        (blob, true)
                    }
                }
            }
            None if line.trim().is_empty() => {
                debug!("result reader: skipping blank line");
                return;
            }
            None => (line, false),
        };

        let parsed = if continued {
            parse_status_blob(&blob)
        } else {
            parse_result_blob(&blob)
        };
        match parsed {
            ResultParse::Complete {
                message,
                diagnostic,
            } => {
                debug!(status = %message.status(), "result reader: message complete");
                events.push(Event::Result(message));
                if let Some(diagnostic) = diagnostic {
                    push_diagnostic(events, diagnostic);
                }
            }
            ResultParse::NeedMoreData => {
                debug!("result reader: usage block pending");
                self.pending = Some(blob);
            }
            ResultParse::Hangup => self.finish(events),
            ResultParse::Unrecognized(diagnostic) => push_diagnostic(events, diagnostic),
        }
    }

    fn finish(&mut self, events: &mut Vec<Event>) {
        debug!("result reader: hangup marker received");
        self.pending = None;
        self.finished = true;
        events.push(Event::EndOfStream);
    }

    /// Whether the hang-up marker has been seen.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether a usage block is waiting for its terminator.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Bytes buffered plus any pending usage text.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.lines.len() + self.pending.as_ref().map_or(0, String::len)
    }

    /// Discard partial input and clear the finished state.
    pub fn reset(&mut self) {
        self.lines.reset();
        self.pending = None;
        self.carried.clear();
        self.finished = false;
    }
}

fn push_diagnostic(events: &mut Vec<Event>, diagnostic: Diagnostic) {
    diagnostic.log("result reader");
    events.push(Event::Diagnostic(diagnostic));
}
