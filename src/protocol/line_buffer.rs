//! Newline framing over an arbitrarily chunked byte stream.
//!
//! Framing is delegated to [`tokio_util::codec::AnyDelimiterCodec`] with a
//! single `\n` delimiter. It yields raw [`Bytes`], so invalid UTF-8 is left
//! for the individual parsers to judge.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

use crate::{AgiError, Result};

const NEWLINE: u8 = b'\n';

/// `\n` framing that rejects lines longer than `max_length` bytes.
pub(crate) fn line_framing(max_length: usize) -> AnyDelimiterCodec {
    AnyDelimiterCodec::new_with_max_length(vec![NEWLINE], vec![NEWLINE], max_length)
}

/// Splits a byte stream into `\n`-terminated lines.
///
/// Bytes after the last newline are retained as the tail and prepended to
/// the next chunk. The newline itself is excluded from every emitted line;
/// a preceding `\r` is left in place for the caller to interpret.
///
/// Lines can be drained all at once with [`feed`](Self::feed) or pulled one
/// at a time with [`extend`](Self::extend) + [`next_line`](Self::next_line),
/// in which case everything not yet pulled stays in the buffer.
///
/// With a maximum length set, a line longer than the limit fails with
/// `AgiError::Codec("line too long: …")` and the rest of that line, up to
/// and including its newline, is discarded by the following pulls.
#[derive(Debug)]
pub struct LineBuffer {
    codec: AnyDelimiterCodec,
    buf: BytesMut,
    max_length: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty buffer with no line length limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(usize::MAX)
    }

    /// Create an empty buffer rejecting lines longer than `max_length` bytes.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            codec: line_framing(max_length),
            buf: BytesMut::new(),
            max_length,
        }
    }

    /// Longest line accepted, in bytes.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Append `chunk` to the buffer and return every complete line.
    ///
    /// Returns an empty vector when the combined buffer holds no newline;
    /// in that case the whole buffer becomes the tail.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when a line exceeds the maximum length.
    /// Lines completed before the oversized one are dropped with it.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        self.extend(chunk);
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Append `chunk` without splitting.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Remove and return the next complete line, if one is buffered.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Codec` when the line exceeds the maximum length.
    pub fn next_line(&mut self) -> Result<Option<Bytes>> {
        self.codec
            .decode(&mut self.buf)
            .map_err(|err| framing_error(err, self.max_length))
    }

    /// Bytes buffered but not yet returned as lines.
    #[must_use]
    pub fn tail(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remove and return every buffered byte, leaving the buffer empty.
    pub fn take_tail(&mut self) -> Bytes {
        self.codec = line_framing(self.max_length);
        self.buf.split().freeze()
    }

    /// Discard all buffered bytes and any partially discarded line.
    pub fn reset(&mut self) {
        self.codec = line_framing(self.max_length);
        self.buf.clear();
    }
}

/// Map an [`AnyDelimiterCodecError`] to an [`AgiError`].
pub(crate) fn framing_error(err: AnyDelimiterCodecError, max_length: usize) -> AgiError {
    match err {
        AnyDelimiterCodecError::MaxChunkLengthExceeded => {
            AgiError::Codec(format!("line too long: exceeded {max_length} bytes"))
        }
        AnyDelimiterCodecError::Io(io_err) => AgiError::Io(io_err.to_string()),
    }
}

/// Strip a single trailing `\r` left over from CRLF line endings.
pub(crate) fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
