//! Stateful, per-connection stream readers.
//!
//! Each reader owns its own [`LineBuffer`](crate::protocol::LineBuffer) and
//! is fed raw chunks of any size, including empty ones. None of them block:
//! "waiting for more data" is simply an empty result.
//!
//! - [`RequestHeaderReader`]: header block up to the first blank line.
//! - [`ResultReader`]: status lines, including multi-line usage blocks.
//! - [`CommandReader`]: command lines (gateway side).
//! - [`StreamDemuxer`]: picks the reader for the current [`Phase`].

pub mod command;
pub mod demux;
pub mod event;
pub mod request;
pub mod result;

pub use crate::protocol::diagnostic::{Diagnostic, Severity};
pub use command::CommandReader;
pub use demux::{Phase, Role, StreamDemuxer};
pub use event::Event;
pub use request::RequestHeaderReader;
pub use result::ResultReader;
