#![forbid(unsafe_code)]

//! `agi-wire`: streaming parser and encoder for the Asterisk Gateway
//! Interface wire protocol.
//!
//! Raw bytes flow through a [`LineBuffer`](protocol::LineBuffer) into one of
//! three readers chosen by protocol phase: the request header block, result
//! lines, or command lines. [`StreamDemuxer`](stream::StreamDemuxer) does the
//! routing; [`codec::AgiCodec`] and [`session`] adapt it to tokio.

pub mod codec;
pub mod config;
pub mod errors;
pub mod protocol;
pub mod session;
pub mod stream;

pub use config::ParserConfig;
pub use errors::{AgiError, Result};
