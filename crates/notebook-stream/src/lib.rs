//! Notebook Stream Library
//!
//! Client-side core of the notebook chat application's streaming endpoints:
//! an incremental decoder that rebuilds discrete JSON events from an
//! arbitrarily fragmented HTTP body, and the consumption loop that drives it
//! from a live response.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use notebook_stream::{GenerateRequest, NotebookClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = NotebookClient::new("http://localhost:8000")?;
//!
//!     let mut events = client.generate_events(GenerateRequest::new(1, "summary"));
//!     while let Some(event) = events.next().await {
//!         if let Some(text) = event.content.as_deref() {
//!             print!("{}", text);
//!         }
//!         if event.is_error() {
//!             break;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Decoding Without a Transport
//!
//! [`StreamDecoder`] is independent of any HTTP machinery:
//!
//! ```rust
//! use notebook_stream::{StreamDecoder, StreamEvent};
//!
//! let mut events = Vec::new();
//! let mut decoder = StreamDecoder::new();
//! decoder.feed("data: {\"type\":\"con", &mut |e: StreamEvent| events.push(e));
//! decoder.feed("tent\",\"content\":\"hi\"}\n", &mut |e: StreamEvent| events.push(e));
//! decoder.finish(&mut |e: StreamEvent| events.push(e));
//!
//! assert_eq!(events, vec![StreamEvent::content("hi")]);
//! ```
//!
//! # Testing
//!
//! The `testing` module provides utilities for integration testing:
//!
//! ```rust,ignore
//! use notebook_stream::testing::{sse_body, TestServer};
//!
//! let server = TestServer::start(router).await?;
//! server.client.stream_chat(&request, &mut sink).await;
//! ```

mod client;
pub mod config;
mod error;
pub mod streaming;
pub mod testing;
mod types;

pub use client::{EventStream, NotebookClient, StreamEndpoint};
pub use config::{ClientConfig, ConfigError};
pub use error::{NotebookClientError, Result};
pub use types::*;

// Re-export streaming types for convenience
pub use streaming::{
    EventKind, EventSink, StreamDecoder, StreamDiagnostics, StreamEvent, StreamOutcome,
};
