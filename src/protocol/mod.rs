//! Pure, synchronous AGI wire-format parsers and encoders.
//!
//! Nothing here performs I/O or keeps per-connection state beyond the
//! [`LineBuffer`](line_buffer::LineBuffer) tail; the stateful readers in
//! [`crate::stream`] compose these pieces.
//!
//! - `line_buffer`: newline framing of arbitrary byte chunks.
//! - `headers`: request header block → [`RequestHeaders`](headers::RequestHeaders).
//! - `result`: status line(s) → [`ResultMessage`](result::ResultMessage).
//! - `command`: command line ↔ [`CommandMessage`](command::CommandMessage).

pub mod command;
pub mod diagnostic;
pub mod fields;
pub mod headers;
pub mod line_buffer;
pub mod result;
pub mod status;

pub use command::{AgiCommand, CommandMessage};
pub use diagnostic::{Diagnostic, Severity};
pub use fields::Fields;
pub use headers::{RequestHeaders, RequestUrl};
pub use line_buffer::LineBuffer;
pub use result::ResultMessage;
pub use status::AgiStatus;
