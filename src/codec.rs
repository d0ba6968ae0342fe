//! `tokio_util` codec for AGI streams.
//!
//! Wraps a [`StreamDemuxer`] so the protocol can be driven by
//! [`tokio_util::codec::FramedRead`] (inbound) and
//! [`tokio_util::codec::FramedWrite`] (outbound). Decoding yields one
//! [`Event`] per call; encoding accepts [`CommandMessage`] (script side) and
//! [`ResultMessage`] (gateway side).
//!
//! After a decode error [`FramedRead`](tokio_util::codec::FramedRead) ends
//! the stream.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use agi_wire::codec::AgiCodec;
//! use agi_wire::stream::Role;
//!
//! let reader = FramedRead::new(socket_read_half, AgiCodec::new(Role::Script));
//! ```

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::{AnyDelimiterCodec, Decoder, Encoder};
use tracing::debug;

use crate::config::ParserConfig;
use crate::protocol::line_buffer::{framing_error, line_framing};
use crate::protocol::{CommandMessage, ResultMessage};
use crate::stream::{Event, Phase, Role, StreamDemuxer};
use crate::{AgiError, Result};

/// Codec pairing `\n` line framing with the phase demuxer.
///
/// Framing is delegated to an [`AnyDelimiterCodec`] bounded by
/// `max_line_bytes`. A line over the limit fails with
/// `AgiError::Codec("line too long: …")`; if decoding continues, the rest of
/// that line up to its newline is discarded.
#[derive(Debug)]
pub struct AgiCodec {
    lines: AnyDelimiterCodec,
    demux: StreamDemuxer,
    queued: VecDeque<Event>,
    max_line_bytes: usize,
}

impl AgiCodec {
    /// Create a codec for `role` with the default [`ParserConfig`].
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self::with_config(role, &ParserConfig::default())
    }

    /// Create a codec for `role` using `config`.
    #[must_use]
    pub fn with_config(role: Role, config: &ParserConfig) -> Self {
        Self {
            lines: line_framing(config.max_line_bytes),
            demux: StreamDemuxer::new(role, config),
            queued: VecDeque::new(),
            max_line_bytes: config.max_line_bytes,
        }
    }

    /// Current protocol phase of the inner demuxer.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.demux.phase()
    }
}

impl Decoder for AgiCodec {
    type Item = Event;
    type Error = AgiError;

    /// Decode the next event from `src`.
    ///
    /// Complete lines are taken from `src` until one yields an event;
    /// further events from that line are queued for the following calls.
    /// Returns `Ok(None)` when no event is complete yet.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when a line, or the request header block,
    /// exceeds the configured maximum, and `AgiError::Header` for a
    /// malformed header block.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Ok(Some(event));
            }
            let Some(line) = self
                .lines
                .decode(src)
                .map_err(|err| framing_error(err, self.max_line_bytes))?
            else {
                return Ok(None);
            };
            self.queued.extend(self.demux.feed_line(line)?);
        }
    }

    /// Decode what remains once the input has ended.
    ///
    /// An unterminated final line is not a complete message and is dropped.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        if !src.is_empty() {
            debug!(bytes = src.len(), "agi codec: unterminated input at EOF discarded");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<CommandMessage> for AgiCodec {
    type Error = AgiError;

    /// Encode `item` as a command line into `dst`.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Encode` if an argument cannot be represented.
    fn encode(&mut self, item: CommandMessage, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(item.encode()?.as_bytes());
        Ok(())
    }
}

impl Encoder<ResultMessage> for AgiCodec {
    type Error = AgiError;

    /// Encode `item` as a status line into `dst`.
    fn encode(&mut self, item: ResultMessage, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(item.encode().as_bytes());
        Ok(())
    }
}
