//! Events produced by the stream readers.

use crate::protocol::{CommandMessage, Diagnostic, RequestHeaders, ResultMessage};

/// One item emitted while feeding bytes to a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A complete request header block.
    Request(RequestHeaders),
    /// A complete result message.
    Result(ResultMessage),
    /// A complete command line.
    Command(CommandMessage),
    /// A recoverable anomaly; parsing continues.
    Diagnostic(Diagnostic),
    /// The hang-up marker (or a `HANGUP` command) ended the stream.
    EndOfStream,
}

impl Event {
    /// Whether this event ends the stream.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
