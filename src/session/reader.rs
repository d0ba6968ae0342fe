//! AGI reader task.
//!
//! Reads an AGI byte stream through [`FramedRead`] backed by [`AgiCodec`]
//! and forwards every decoded [`Event`] through a tokio [`mpsc`] channel.
//!
//! | Stream condition             | Behaviour                                   |
//! |------------------------------|---------------------------------------------|
//! | event decoded                | forwarded; `EndOfStream` stops the task     |
//! | line or header block too big | logged at `WARN`, `EndOfStream` sent, stops |
//! | malformed header block       | logged at `WARN`, task stops                |
//! | I/O error                    | logged at `WARN`, `EndOfStream` sent, stops |
//! | EOF                          | `EndOfStream` sent, stops                   |

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::AgiCodec;
use crate::stream::Event;
use crate::{AgiError, Result};

/// AGI reader task: decodes `reader` and emits [`Event`]s on `event_tx`.
///
/// # Cancellation
///
/// Respects `cancel`: when the token fires the reader exits cleanly without
/// emitting an end-of-stream event.
///
/// # Errors
///
/// Returns `Err(AgiError::Header)` when the request header block is
/// malformed; every other condition ends with `Ok(())`.
pub async fn run_reader<R>(
    stream_id: String,
    reader: R,
    codec: AgiCodec,
    event_tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(reader, codec);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(stream_id, "agi reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!(stream_id, "agi reader: EOF detected");
                        send_event(&event_tx, &stream_id, Event::EndOfStream).await;
                        break;
                    }

                    Some(Err(AgiError::Codec(ref msg))) => {
                        warn!(
                            stream_id,
                            error = msg.as_str(),
                            "agi reader: codec framing error, ending stream"
                        );
                        send_event(&event_tx, &stream_id, Event::EndOfStream).await;
                        break;
                    }

                    Some(Err(err @ AgiError::Header(_))) => {
                        warn!(stream_id, error = %err, "agi reader: malformed request headers, stopping");
                        return Err(err);
                    }

                    Some(Err(err)) => {
                        warn!(stream_id, error = %err, "agi reader: IO error, stopping");
                        send_event(&event_tx, &stream_id, Event::EndOfStream).await;
                        break;
                    }

                    Some(Ok(event)) => {
                        let done = event.is_end_of_stream();
                        if !send_event(&event_tx, &stream_id, event).await || done {
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Send `event`, returning `false` once the receiver is gone.
async fn send_event(event_tx: &mpsc::Sender<Event>, stream_id: &str, event: Event) -> bool {
    if event_tx.send(event).await.is_err() {
        debug!(stream_id, "agi reader: event_tx closed, stopping");
        return false;
    }
    true
}
