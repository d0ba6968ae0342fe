//! Request header phase reader.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::HeaderKeys;
use crate::protocol::headers::{parse_header_block, RequestHeaders};
use crate::protocol::line_buffer::{trim_cr, LineBuffer};
use crate::{AgiError, Result};

/// Accumulates header lines until a blank line completes the block.
///
/// Only the first blank line in the input completes a block; anything after
/// it stays buffered, untouched, until the caller either feeds again (to
/// read another block) or drains it with
/// [`take_unconsumed`](Self::take_unconsumed) for the next protocol phase.
///
/// With a byte limit set, both a single line and the accumulated block are
/// bounded by it. A block that outgrows the limit fails with
/// `AgiError::Codec` and its remaining lines are skipped up to the next
/// blank line.
#[derive(Debug)]
pub struct RequestHeaderReader {
    lines: LineBuffer,
    block: Vec<Bytes>,
    block_bytes: usize,
    max_block_bytes: usize,
    discarding: bool,
    keys: HeaderKeys,
}

impl Default for RequestHeaderReader {
    fn default() -> Self {
        Self::new(HeaderKeys::default())
    }
}

impl RequestHeaderReader {
    /// Create a reader that derives `path`/`method` using `keys`.
    #[must_use]
    pub fn new(keys: HeaderKeys) -> Self {
        Self {
            lines: LineBuffer::new(),
            block: Vec::new(),
            block_bytes: 0,
            max_block_bytes: usize::MAX,
            discarding: false,
            keys,
        }
    }

    /// Bound lines and the whole header block to `max` bytes.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.lines = LineBuffer::with_max_length(max);
        self.max_block_bytes = max;
        self
    }

    /// Feed the next chunk of the stream.
    ///
    /// Returns `Ok(None)` while the block is incomplete.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Header` if the completed block contains a
    /// malformed line. The block is discarded; bytes after its terminator
    /// remain buffered. Returns `AgiError::Codec` when a line or the block
    /// exceeds the byte limit.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<RequestHeaders>> {
        self.lines.extend(chunk);

        while let Some(line) = self.lines.next_line()? {
            if let Some(headers) = self.push_line(line)? {
                return Ok(Some(headers));
            }
        }

        Ok(None)
    }

    /// Consume one complete line, without its newline.
    ///
    /// Returns the parsed block when `line` is the blank terminator.
    ///
    /// # Errors
    ///
    /// Same as [`feed`](Self::feed).
    pub fn push_line(&mut self, line: Bytes) -> Result<Option<RequestHeaders>> {
        let blank = trim_cr(&line).is_empty();

        if self.discarding {
            if blank {
                debug!("request headers: oversized block skipped");
                self.discarding = false;
            }
            return Ok(None);
        }

        if blank {
            let block = std::mem::take(&mut self.block);
            self.block_bytes = 0;
            debug!(lines = block.len(), "request headers: block complete");
            return parse_header_block(&block, &self.keys).map(Some);
        }

        self.block_bytes = self.block_bytes.saturating_add(line.len() + 1);
        if self.block_bytes > self.max_block_bytes {
            warn!(
                limit = self.max_block_bytes,
                "request headers: block too long, skipping to its terminator"
            );
            self.block.clear();
            self.block_bytes = 0;
            self.discarding = true;
            return Err(AgiError::Codec(format!(
                "request header block too long: exceeded {} bytes",
                self.max_block_bytes
            )));
        }
        self.block.push(line);
        Ok(None)
    }

    /// Drain every byte received after the last completed block.
    ///
    /// Lines already accumulated into an unfinished block are not included.
    pub fn take_unconsumed(&mut self) -> Bytes {
        self.lines.take_tail()
    }

    /// Bytes held for the unfinished block, buffered lines included.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.lines.len() + self.block_bytes
    }

    /// Discard all partial input.
    pub fn reset(&mut self) {
        self.lines.reset();
        self.block.clear();
        self.block_bytes = 0;
        self.discarding = false;
    }
}
