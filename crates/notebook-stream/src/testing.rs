//! Test utilities for notebook-stream
//!
//! Provides an in-process HTTP server for end-to-end tests and a scripted
//! transport for exercising the consumption loop without a network.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header;
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::net::TcpListener;

use crate::config::ClientConfig;
use crate::streaming::StreamResponse;
use crate::{NotebookClient, Result};

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: NotebookClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Create a new test server from an axum Router
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::post, Router};
    /// use notebook_stream::testing::{sse_body, TestServer};
    ///
    /// let router = Router::new().route(
    ///     "/api/v1/chat/",
    ///     post(|| async { sse_body(["data: {\"type\":\"done\"}\n"]) }),
    /// );
    /// let server = TestServer::start(router).await?;
    /// ```
    pub async fn start(router: axum::Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Create a new test server with custom timeouts
    pub async fn start_with_timeout(
        router: axum::Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let config = ClientConfig::builder(format!("http://{}", addr))
            .request_timeout_ms(timeout.as_millis() as u64)
            .connect_timeout_ms(connect_timeout.as_millis() as u64)
            .build();
        let client = NotebookClient::from_config(&config)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Response body that sends each chunk as its own body frame
pub fn sse_body<I, T>(chunks: I) -> axum::response::Response
where
    I: IntoIterator<Item = T>,
    T: Into<Bytes>,
{
    let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
    let body = Body::from_stream(stream::iter(chunks).then(|chunk| async move {
        // yield between frames so they are written separately
        tokio::task::yield_now().await;
        Ok::<_, Infallible>(chunk)
    }));

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

// =============================================================================
// Scripted Transport
// =============================================================================

/// Error produced by a [`ScriptedResponse`] body
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ScriptedError(pub String);

#[derive(Debug, Clone)]
enum Ending {
    Done,
    Fail(String),
    Hang,
}

/// In-memory [`StreamResponse`] with a fixed status and chunk sequence
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    status: u16,
    /// `None` makes reading the rejected body fail
    error_body: Option<Bytes>,
    chunks: Option<Vec<Bytes>>,
    ending: Ending,
}

impl ScriptedResponse {
    /// Successful response delivering `chunks` in order
    pub fn ok<I, T>(chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Self::ok_bytes(chunks.into_iter().map(Into::into).collect())
    }

    pub fn ok_bytes(chunks: Vec<Bytes>) -> Self {
        Self {
            status: 200,
            error_body: Some(Bytes::new()),
            chunks: Some(chunks),
            ending: Ending::Done,
        }
    }

    /// Non-success response with the given body
    pub fn rejected(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            error_body: Some(body.into()),
            chunks: Some(Vec::new()),
            ending: Ending::Done,
        }
    }

    /// Non-success response whose body cannot be read
    pub fn rejected_unreadable(status: u16) -> Self {
        Self {
            status,
            error_body: None,
            chunks: Some(Vec::new()),
            ending: Ending::Done,
        }
    }

    /// Successful response with nothing to read
    pub fn without_body() -> Self {
        Self {
            status: 200,
            error_body: Some(Bytes::new()),
            chunks: None,
            ending: Ending::Done,
        }
    }

    /// Fail the read after the last chunk
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.ending = Ending::Fail(message.into());
        self
    }

    /// Never complete after the last chunk
    pub fn then_hang(mut self) -> Self {
        self.ending = Ending::Hang;
        self
    }
}

#[async_trait]
impl StreamResponse for ScriptedResponse {
    type Error = ScriptedError;
    type Body = BoxStream<'static, std::result::Result<Bytes, ScriptedError>>;

    fn status_code(&self) -> u16 {
        self.status
    }

    async fn error_body(self) -> std::result::Result<Bytes, ScriptedError> {
        self.error_body
            .ok_or_else(|| ScriptedError("connection closed while reading body".into()))
    }

    fn into_body(self) -> Option<Self::Body> {
        let chunks = stream::iter(self.chunks?.into_iter().map(Ok));
        let body = match self.ending {
            Ending::Done => chunks.boxed(),
            Ending::Fail(message) => chunks
                .chain(stream::once(async move { Err(ScriptedError(message)) }))
                .boxed(),
            Ending::Hang => chunks.chain(stream::pending()).boxed(),
        };
        Some(body)
    }
}
