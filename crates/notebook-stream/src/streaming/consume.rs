//! Stream consumption loop
//!
//! Drives one [`StreamDecoder`] from one transport response and reports
//! transport conditions as terminal `error` events on the same sink.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use tracing::{debug, warn};

use super::decoder::StreamDecoder;
use super::sink::EventSink;
use super::types::StreamEvent;
use super::utf8::Utf8Decoder;
use crate::types::ErrorBody;

/// Transport response feeding a stream
#[async_trait]
pub trait StreamResponse: Send {
    /// Error raised by a failed body read
    type Error: std::fmt::Display + Send;

    /// Byte fragments of the response body
    type Body: Stream<Item = Result<Bytes, Self::Error>> + Send + Unpin;

    /// HTTP status code
    fn status_code(&self) -> u16;

    /// Whether the status is in the success range
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code())
    }

    /// Read the whole body of a rejected response
    async fn error_body(self) -> Result<Bytes, Self::Error>;

    /// Open the body for streaming, `None` if there is nothing to read
    fn into_body(self) -> Option<Self::Body>;
}

#[async_trait]
impl StreamResponse for reqwest::Response {
    type Error = reqwest::Error;
    type Body = BoxStream<'static, Result<Bytes, reqwest::Error>>;

    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    async fn error_body(self) -> Result<Bytes, reqwest::Error> {
        self.bytes().await
    }

    fn into_body(self) -> Option<Self::Body> {
        Some(self.bytes_stream().boxed())
    }
}

/// Fixed diagnostics reported when the transport gives no better reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDiagnostics {
    /// Reported when the response carries no readable body
    pub no_body: &'static str,
    /// Reported when a body read fails without a description
    pub read_failure: &'static str,
}

impl Default for StreamDiagnostics {
    fn default() -> Self {
        Self {
            no_body: "No response body",
            read_failure: "Stream error",
        }
    }
}

/// How a consumed stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Transport reached end-of-stream and the tail was flushed
    Completed,
    /// Server answered with a non-success status
    Rejected { status: u16 },
    /// Response had no readable body
    NoBody,
    /// A body read failed after streaming started
    Interrupted,
    /// Request never produced a response
    Unreachable,
    /// Caller stopped waiting for the stream
    Cancelled,
}

impl StreamOutcome {
    /// True unless the stream ended with a terminal error event
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Consume a response, emitting decoded events and at most one terminal
/// error event to `sink`
pub async fn consume_response<R, S>(
    response: R,
    diagnostics: &StreamDiagnostics,
    sink: &mut S,
) -> StreamOutcome
where
    R: StreamResponse,
    S: EventSink + ?Sized,
{
    let status = response.status_code();

    if !response.is_success() {
        let body = response.error_body().await.ok();
        let reason = ErrorBody::reason(status, body.as_deref());
        warn!(status, %reason, "Stream request rejected");
        sink.emit(StreamEvent::error(reason));
        return StreamOutcome::Rejected { status };
    }

    let Some(mut body) = response.into_body() else {
        warn!("Response has no readable body");
        sink.emit(StreamEvent::error(diagnostics.no_body));
        return StreamOutcome::NoBody;
    };

    let mut text = Utf8Decoder::new();
    let mut decoder = StreamDecoder::new();
    let mut received = 0usize;

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                received += bytes.len();
                let fragment = text.decode(&bytes);
                decoder.feed(&fragment, sink);
            }
            Err(e) => {
                let description = e.to_string();
                let message = if description.is_empty() {
                    diagnostics.read_failure.to_string()
                } else {
                    description
                };
                warn!(received, error = %message, "Stream interrupted");
                sink.emit(StreamEvent::error(message));
                return StreamOutcome::Interrupted;
            }
        }
    }

    decoder.feed(&text.finish(), sink);
    decoder.finish(sink);

    debug!(received, "Stream completed");
    StreamOutcome::Completed
}

/// Like [`consume_response`], but stops as soon as `cancel` resolves
///
/// Cancellation drops the response, so pending reads stop. No event is
/// emitted for it.
pub async fn consume_until<R, S, C>(
    response: R,
    diagnostics: &StreamDiagnostics,
    sink: &mut S,
    cancel: C,
) -> StreamOutcome
where
    R: StreamResponse,
    S: EventSink + ?Sized,
    C: Future<Output = ()>,
{
    tokio::select! {
        outcome = consume_response(response, diagnostics, sink) => outcome,
        _ = cancel => {
            debug!("Stream cancelled");
            StreamOutcome::Cancelled
        }
    }
}
