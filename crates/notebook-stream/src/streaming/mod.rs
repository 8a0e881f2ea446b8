//! Incremental decoding of notebook event streams
//!
//! The server answers streaming requests with a body of `\n`-terminated
//! lines. Lines starting with `data: ` carry one JSON event each; anything
//! else (blank keep-alives, comments) is ignored.
//!
//! # Example
//!
//! ```no_run
//! use notebook_stream::{ChatRequest, NotebookClient, StreamEvent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NotebookClient::new("http://localhost:8000")?;
//! let request = ChatRequest::new(1, "What are the key findings?");
//!
//! let outcome = client
//!     .stream_chat(&request, &mut |event: StreamEvent| {
//!         if let Some(text) = &event.content {
//!             print!("{}", text);
//!         }
//!         if let Some(reason) = event.error_text() {
//!             eprintln!("Stream error: {}", reason);
//!         }
//!     })
//!     .await;
//!
//! println!("\nstream ended: {:?}", outcome);
//! # Ok(())
//! # }
//! ```

mod consume;
mod decoder;
mod sink;
mod types;
mod utf8;

pub use consume::{
    consume_response, consume_until, StreamDiagnostics, StreamOutcome, StreamResponse,
};
pub use decoder::{decode_line, StreamDecoder, DATA_PREFIX};
pub use sink::EventSink;
pub use types::{EventKind, StreamEvent};
pub use utf8::Utf8Decoder;
