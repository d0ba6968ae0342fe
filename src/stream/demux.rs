//! Phase-driven demultiplexer over a single byte stream.

use bytes::Bytes;
use tracing::debug;

use crate::config::ParserConfig;
use crate::protocol::RequestHeaders;
use crate::stream::{CommandReader, Event, RequestHeaderReader, ResultReader};
use crate::Result;

/// Which side of the connection the demuxer is reading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The script side: reads the request header block, then results.
    Script,
    /// The gateway side: reads commands.
    Gateway,
}

/// Protocol phase deciding which reader consumes the next bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the request header block.
    RequestHeaders,
    /// Reading result lines.
    Results,
    /// Reading command lines.
    Commands,
}

/// Routes stream bytes to the reader for the current phase.
///
/// On the script side, bytes following the header block terminator in the
/// same chunk are handed to the result reader, so nothing is lost at the
/// phase switch.
#[derive(Debug)]
pub struct StreamDemuxer {
    phase: Phase,
    request: RequestHeaderReader,
    results: ResultReader,
    commands: CommandReader,
}

impl StreamDemuxer {
    /// Create a demuxer starting in the first phase for `role`.
    #[must_use]
    pub fn new(role: Role, config: &ParserConfig) -> Self {
        let phase = match role {
            Role::Script => Phase::RequestHeaders,
            Role::Gateway => Phase::Commands,
        };
        Self {
            phase,
            request: RequestHeaderReader::new(config.headers.clone())
                .with_max_line_bytes(config.max_line_bytes),
            results: ResultReader::new().with_max_line_bytes(config.max_line_bytes),
            commands: CommandReader::new().with_max_line_bytes(config.max_line_bytes),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Force a phase, e.g. to read another header block on a reused stream.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Feed the next chunk and return every completed event, in stream order.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Header` for a malformed header block. Bytes after
    /// the block stay buffered and the phase does not advance. Returns
    /// `AgiError::Codec` when a line or the header block exceeds
    /// `max_line_bytes`.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Event>> {
        match self.phase {
            Phase::RequestHeaders => {
                let Some(headers) = self.request.feed(chunk)? else {
                    return Ok(Vec::new());
                };
                let request = self.enter_results(headers);
                self.results.defer(request);
                let rest = self.request.take_unconsumed();
                self.results.feed(&rest)
            }
            Phase::Results => self.results.feed(chunk),
            Phase::Commands => self.commands.feed(chunk),
        }
    }

    /// Route one complete line, without its newline, to the current phase.
    ///
    /// # Errors
    ///
    /// Same as [`feed`](Self::feed), minus the per-line limit, which the
    /// caller's framing enforces.
    pub fn feed_line(&mut self, line: Bytes) -> Result<Vec<Event>> {
        match self.phase {
            Phase::RequestHeaders => {
                let mut events = Vec::new();
                if let Some(headers) = self.request.push_line(line)? {
                    events.push(self.enter_results(headers));
                }
                Ok(events)
            }
            Phase::Results => Ok(self.results.push_line(&line)),
            Phase::Commands => Ok(self.commands.push_line(&line)),
        }
    }

    fn enter_results(&mut self, headers: RequestHeaders) -> Event {
        debug!(method = headers.method(), path = headers.path(), "demux: switching to results");
        self.phase = Phase::Results;
        Event::Request(headers)
    }

    /// Feed bytes to the request header reader regardless of phase.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Header` for a malformed header block.
    pub fn feed_request_headers(&mut self, chunk: &[u8]) -> Result<Option<RequestHeaders>> {
        self.request.feed(chunk)
    }

    /// Feed bytes to the result reader regardless of phase.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when a line exceeds `max_line_bytes`.
    pub fn feed_result(&mut self, chunk: &[u8]) -> Result<Vec<Event>> {
        self.results.feed(chunk)
    }

    /// Feed bytes to the command reader regardless of phase.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when a line exceeds `max_line_bytes`.
    pub fn feed_command(&mut self, chunk: &[u8]) -> Result<Vec<Event>> {
        self.commands.feed(chunk)
    }

    /// Whether the active reader has seen the end of the stream.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match self.phase {
            Phase::RequestHeaders => false,
            Phase::Results => self.results.is_finished(),
            Phase::Commands => self.commands.is_finished(),
        }
    }

    /// Bytes held by the active reader for incomplete input.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        match self.phase {
            Phase::RequestHeaders => self.request.buffered_len(),
            Phase::Results => self.results.buffered_len(),
            Phase::Commands => self.commands.buffered_len(),
        }
    }

    /// Discard partial input held by every reader; the phase is kept.
    pub fn reset(&mut self) {
        self.request.reset();
        self.results.reset();
        self.commands.reset();
    }
}
