//! Line-framed event decoder
//!
//! Turns arbitrarily fragmented stream text into [`StreamEvent`]s. Records are
//! `\n`-terminated lines; only lines starting with `data: ` carry an event,
//! and their payload is a JSON object.

use tracing::trace;

use super::sink::EventSink;
use super::types::StreamEvent;

/// Framing prefix of event-carrying lines
pub const DATA_PREFIX: &str = "data: ";

/// Incremental decoder state for one stream
///
/// Create one per stream, call [`feed`](Self::feed) for every fragment and
/// [`finish`](Self::finish) once the transport is done. `finish` consumes the
/// decoder, so it cannot be fed after the stream is closed.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Text received after the last newline
    buffer: String,
}

impl StreamDecoder {
    /// Create a new decoder with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Text held back waiting for its terminating newline
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Feed the next fragment and emit every event it completes
    pub fn feed<S>(&mut self, fragment: &str, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let Some(last_newline) = fragment.rfind('\n') else {
            self.buffer.push_str(fragment);
            return;
        };

        // Split complete lines off before emitting anything, so the buffer is
        // already consistent if the sink panics
        let (head, tail) = fragment.split_at(last_newline + 1);
        let mut complete = std::mem::replace(&mut self.buffer, tail.to_string());
        complete.push_str(&head[..head.len() - 1]);

        for line in complete.split('\n') {
            emit_line(line, sink);
        }
    }

    /// Flush whatever is left in the buffer at end-of-stream
    pub fn finish<S>(self, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        if self.buffer.trim().is_empty() {
            return;
        }

        trace!(len = self.buffer.len(), "flushing unterminated stream tail");
        for line in self.buffer.split('\n') {
            emit_line(line, sink);
        }
    }
}

fn emit_line<S>(line: &str, sink: &mut S)
where
    S: EventSink + ?Sized,
{
    if let Some(event) = decode_line(line) {
        sink.emit(event);
    }
}

/// Decode a single complete record
///
/// Returns `None` for lines without the framing prefix, empty payloads and
/// payloads that are not a JSON object.
pub fn decode_line(line: &str) -> Option<StreamEvent> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        if !line.trim().is_empty() {
            trace!("ignoring unframed line");
        }
        return None;
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            let preview: String = payload.chars().take(100).collect();
            trace!(error = %e, payload = %preview, "dropping malformed event payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(decoder: &mut StreamDecoder, fragments: &[&str]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for fragment in fragments {
            decoder.feed(fragment, &mut |e: StreamEvent| events.push(e));
        }
        events
    }

    fn decode_whole(fragments: &[&str]) -> Vec<StreamEvent> {
        let mut decoder = StreamDecoder::new();
        let mut events = feed_all(&mut decoder, fragments);
        decoder.finish(&mut |e: StreamEvent| events.push(e));
        events
    }

    #[test]
    fn test_event_split_across_fragments() {
        let mut decoder = StreamDecoder::new();

        let first = feed_all(&mut decoder, &["data: {\"type\":\"con"]);
        assert!(first.is_empty());

        let second = feed_all(&mut decoder, &["tent\",\"content\":\"hi\"}\n"]);
        assert_eq!(second, vec![StreamEvent::content("hi")]);
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_two_events_in_one_fragment() {
        let mut decoder = StreamDecoder::new();

        let events = feed_all(
            &mut decoder,
            &["data: {\"type\":\"a\"}\ndata: {\"type\":\"b\"}\n"],
        );

        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["a", "b"]);
    }

    #[test]
    fn test_unframed_line_is_ignored() {
        let mut decoder = StreamDecoder::new();

        let events = feed_all(&mut decoder, &["keepalive\n"]);

        assert!(events.is_empty());
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_malformed_payload_is_dropped() {
        let mut decoder = StreamDecoder::new();

        let events = feed_all(&mut decoder, &["data: {not json}\n"]);
        assert!(events.is_empty());

        let events = feed_all(&mut decoder, &["data: {\"type\":\"done\"}\n"]);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_done());
    }

    #[test]
    fn test_repeated_malformed_lines_do_not_disturb_buffer() {
        let mut decoder = StreamDecoder::new();

        for _ in 0..5 {
            assert!(feed_all(&mut decoder, &["data: {\"type\":\n"]).is_empty());
            assert_eq!(decoder.buffered(), "");
        }

        let events = feed_all(
            &mut decoder,
            &["data: {\"type\":\"content\",", "\"content\":\"ok\"}\n"],
        );
        assert_eq!(events, vec![StreamEvent::content("ok")]);
    }

    #[test]
    fn test_blank_and_empty_payloads() {
        let events =
            decode_whole(&["\n\ndata: \ndata:    \n: comment\ndata: {\"type\":\"x\"}\n\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "x");
    }

    #[test]
    fn test_prefix_requires_trailing_space() {
        let events = decode_whole(&["data:{\"type\":\"x\"}\nDATA: {\"type\":\"y\"}\n"]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = decode_whole(&["data: {\"type\":\"a\"}\r\n\r\ndata: {\"type\":\"b\"}\r\n"]);
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["a", "b"]);
    }

    #[test]
    fn test_non_object_payload_is_dropped() {
        let events = decode_whole(&["data: 42\ndata: \"text\"\ndata: [1,2]\ndata: null\n"]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_every_valid_object_yields_one_event() {
        let events = decode_whole(&[concat!(
            "data: {\"type\":\"content\",\"content\":123}\n",
            "data: {\"type\":\"done\",\"conversation_id\":7.0}\n",
            "data: {\"type\":\"done\",\"conversation_id\":\"7\"}\n",
            "data: {\"type\":null}\n",
            "data: {\"type\":\"error\",\"message\":{\"code\":500}}\n",
        )]);

        assert_eq!(events.len(), 5);
        assert_eq!(events[0].get::<i64>("content"), Some(123));
        assert_eq!(events[1].conversation_id, Some(7));
        assert_eq!(events[2].conversation_id, None);
        assert_eq!(events[3].event_type, "");
        assert!(events[4].is_error());
        assert!(events[4].has("message"));
    }

    #[test]
    fn test_finish_flushes_unterminated_tail() {
        let mut decoder = StreamDecoder::new();
        let mut events =
            feed_all(&mut decoder, &["data: {\"type\":\"a\"}\ndata: {\"type\":\"b\"}"]);
        assert_eq!(events.len(), 1);
        assert_eq!(decoder.buffered(), "data: {\"type\":\"b\"}");

        decoder.finish(&mut |e: StreamEvent| events.push(e));
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, "b");
    }

    #[test]
    fn test_finish_discards_malformed_or_blank_tail() {
        assert!(decode_whole(&["data: {\"type\":\"trunc"]).is_empty());
        assert!(decode_whole(&["   \t "]).is_empty());
        assert!(decode_whole(&["partial line without prefix"]).is_empty());
        assert!(decode_whole(&[]).is_empty());
    }

    #[test]
    fn test_empty_fragments_are_harmless() {
        let events = decode_whole(&["", "data: {\"type\":", "", "\"a\"}", "", "\n", ""]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "a");
    }

    #[test]
    fn test_fragmentation_independence() {
        let stream = concat!(
            "data: {\"type\":\"content\",\"content\":\"Hel\"}\n",
            "\n",
            ": keep-alive\n",
            "data: {\"type\":\"content\",\"content\":\"lo, wörld ✓\"}\n",
            "data: {broken\n",
            "data: {\"type\":\"done\",\"conversation_id\":7}\n",
            "data: {\"type\":\"trailer\"}",
        );

        let expected = decode_whole(&[stream]);
        assert_eq!(expected.len(), 4);
        assert_eq!(expected[3].event_type, "trailer");

        let boundaries: Vec<usize> = (0..=stream.len())
            .filter(|i| stream.is_char_boundary(*i))
            .collect();

        // every single split point
        for &i in &boundaries {
            let (a, b) = stream.split_at(i);
            assert_eq!(decode_whole(&[a, b]), expected, "split at {}", i);
        }

        // every pair of split points
        for (n, &i) in boundaries.iter().enumerate() {
            for &j in &boundaries[n..] {
                let parts = [&stream[..i], &stream[i..j], &stream[j..]];
                assert_eq!(decode_whole(&parts), expected, "split at {} and {}", i, j);
            }
        }

        // one character at a time
        let chars: Vec<String> = stream.chars().map(String::from).collect();
        let parts: Vec<&str> = chars.iter().map(String::as_str).collect();
        assert_eq!(decode_whole(&parts), expected);
    }

    #[test]
    fn test_no_loss_no_duplication() {
        let mut stream = String::new();
        for i in 0..50 {
            stream.push_str(&format!("data: {{\"type\":\"content\",\"content\":\"{}\"}}\n", i));
            if i % 7 == 0 {
                stream.push_str("data: {oops\n");
            }
        }

        let events = decode_whole(&[&stream]);
        let contents: Vec<String> = events.into_iter().filter_map(|e| e.content).collect();
        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(
            decode_line("data:   {\"type\":\"error\",\"message\":\"x\"}  "),
            Some(StreamEvent::error("x"))
        );
        assert!(decode_line("event: message").is_none());
        assert!(decode_line("data: ").is_none());
    }
}
