//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AgiError>;

/// Error enumeration covering every failure mode of the AGI wire layer.
///
/// Content-level anomalies on the stream (stray lines, unknown status codes,
/// unknown command names) are never errors; they surface as
/// [`Diagnostic`](crate::stream::Diagnostic) events instead.
#[derive(Debug)]
pub enum AgiError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Malformed request header block; fatal to the current block.
    Header(String),
    /// A result value could not be reinterpreted as the requested type.
    Coercion(String),
    /// An outbound message cannot be represented on the wire.
    Encode(String),
    /// Framing failure, e.g. a line exceeding the configured maximum.
    Codec(String),
    /// The gateway rejected the command (status 510, or 503).
    InvalidCommand(String),
    /// The gateway refused to run the command (status 511).
    CommandNotPermitted(String),
    /// The command was sent with invalid syntax (status 520).
    Usage(String),
    /// The application returned `-1`: it failed or the channel hung up.
    Application(String),
    /// The stream ended with the hang-up marker or EOF.
    Hangup(String),
    /// Underlying I/O failure.
    Io(String),
}

impl Display for AgiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Header(msg) => write!(f, "header: {msg}"),
            Self::Coercion(msg) => write!(f, "coercion: {msg}"),
            Self::Encode(msg) => write!(f, "encode: {msg}"),
            Self::Codec(msg) => write!(f, "codec: {msg}"),
            Self::InvalidCommand(msg) => write!(f, "invalid command: {msg}"),
            Self::CommandNotPermitted(msg) => write!(f, "command not permitted: {msg}"),
            Self::Usage(msg) => write!(f, "usage: {msg}"),
            Self::Application(msg) => write!(f, "application: {msg}"),
            Self::Hangup(msg) => write!(f, "hangup: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AgiError {}

impl From<toml::de::Error> for AgiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AgiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
