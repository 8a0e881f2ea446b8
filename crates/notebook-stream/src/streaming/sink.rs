//! Event sink abstraction

use tokio::sync::mpsc::UnboundedSender;

use super::types::StreamEvent;

/// Receiver of decoded and terminal events, invoked once per event in
/// stream order.
///
/// Any closure taking a [`StreamEvent`] is a sink, and so is a
/// `Vec<StreamEvent>`:
///
/// ```
/// use notebook_stream::{StreamDecoder, StreamEvent};
///
/// let mut events: Vec<StreamEvent> = Vec::new();
/// let mut decoder = StreamDecoder::new();
/// decoder.feed("data: {\"type\":\"done\"}\n", &mut events);
/// assert_eq!(events.len(), 1);
/// ```
pub trait EventSink {
    fn emit(&mut self, event: StreamEvent);
}

impl<F> EventSink for F
where
    F: FnMut(StreamEvent),
{
    fn emit(&mut self, event: StreamEvent) {
        self(event)
    }
}

impl EventSink for Vec<StreamEvent> {
    fn emit(&mut self, event: StreamEvent) {
        self.push(event);
    }
}

/// Forwards events to a channel
///
/// Events sent after the receiver is dropped are discarded.
impl EventSink for UnboundedSender<StreamEvent> {
    fn emit(&mut self, event: StreamEvent) {
        if self.send(event).is_err() {
            tracing::trace!("event receiver dropped, discarding event");
        }
    }
}
