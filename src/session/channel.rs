//! Script-side command execution over one AGI connection.
//!
//! [`AgiChannel::accept`] consumes the request header block; after that each
//! [`AgiChannel::run_command`] call writes one command and waits for its
//! result. `&mut self` on `run_command` guarantees one command is in flight
//! at a time.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info};

use crate::codec::AgiCodec;
use crate::config::ParserConfig;
use crate::protocol::{AgiStatus, CommandMessage, RequestHeaders, ResultMessage};
use crate::stream::{Event, Role};
use crate::{AgiError, Result};

/// An accepted AGI connection, seen from the script.
#[derive(Debug)]
pub struct AgiChannel<R, W> {
    reader: FramedRead<R, AgiCodec>,
    writer: FramedWrite<W, AgiCodec>,
    request: RequestHeaders,
}

impl<R, W> AgiChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Read the request header block from `reader` and return the channel.
    ///
    /// # Errors
    ///
    /// - `AgiError::Header`: the header block is malformed.
    /// - `AgiError::Codec`: a line or the whole block exceeds
    ///   `max_line_bytes`.
    /// - `AgiError::Hangup`: the stream closed before the block completed.
    /// - `AgiError::Io`: the underlying read failed.
    pub async fn accept(reader: R, writer: W, config: &ParserConfig) -> Result<Self> {
        let mut reader = FramedRead::new(reader, AgiCodec::with_config(Role::Script, config));

        let request = loop {
            match reader.next().await {
                None => {
                    return Err(AgiError::Hangup(
                        "stream closed before request headers completed".into(),
                    ));
                }
                Some(Err(err)) => return Err(err),
                Some(Ok(Event::Request(headers))) => break headers,
                Some(Ok(other)) => {
                    debug!(?other, "agi channel: ignoring event before request headers");
                }
            }
        };

        info!(
            method = request.method(),
            path = request.path(),
            "agi channel: request accepted"
        );

        Ok(Self {
            reader,
            writer: FramedWrite::new(writer, AgiCodec::with_config(Role::Script, config)),
            request,
        })
    }

    /// The request header block read by [`accept`](Self::accept).
    #[must_use]
    pub fn request(&self) -> &RequestHeaders {
        &self.request
    }

    /// Send `command` and return its final result.
    ///
    /// A single `100 Trying` interim result is skipped. The result is passed
    /// through [`ResultMessage::into_checked`].
    ///
    /// # Errors
    ///
    /// - `AgiError::Encode`: an argument cannot be written.
    /// - `AgiError::Hangup`: the gateway hung up or closed the stream.
    /// - `AgiError::InvalidCommand`, `CommandNotPermitted`, `Usage`,
    ///   `Application`: see [`ResultMessage::into_checked`].
    pub async fn run_command(&mut self, command: CommandMessage) -> Result<ResultMessage> {
        let name = command.command();
        self.writer.send(command).await?;
        debug!(command = %name, "agi channel: command sent");

        let mut message = self.next_result().await?;
        if message.status() == AgiStatus::Trying {
            debug!(command = %name, "agi channel: interim result, waiting for final");
            message = self.next_result().await?;
        }

        message.into_checked()
    }

    async fn next_result(&mut self) -> Result<ResultMessage> {
        loop {
            match self.reader.next().await {
                None | Some(Ok(Event::EndOfStream)) => {
                    return Err(AgiError::Hangup("gateway ended the session".into()));
                }
                Some(Err(err)) => return Err(err),
                Some(Ok(Event::Result(message))) => return Ok(message),
                Some(Ok(other)) => {
                    // Diagnostics are already logged by the reader.
                    debug!(?other, "agi channel: skipping non-result event");
                }
            }
        }
    }
}
