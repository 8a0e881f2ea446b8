//! Notebook streaming client
//!
//! Both streaming endpoints (chat and content generation) run through the
//! same request and consumption path and differ only in URL.

use std::future::Future;

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::streaming::{consume_until, EventSink, StreamDiagnostics, StreamEvent, StreamOutcome};
use crate::types::{ChatRequest, GenerateRequest};

/// Stream of events produced by a spawned stream task
///
/// Dropping it cancels the underlying request.
pub type EventStream = UnboundedReceiverStream<StreamEvent>;

/// Streaming endpoints exposed by the notebook server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEndpoint {
    /// Conversational chat over a notebook's documents
    Chat,
    /// Long-form content generation (summaries, FAQs, outlines, ...)
    ContentGeneration,
}

impl StreamEndpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::ContentGeneration => "content generation",
        }
    }
}

/// Notebook streaming API client
#[derive(Debug, Clone)]
pub struct NotebookClient {
    client: Client,
    base_url: Url,
    chat_url: Url,
    content_url: Url,
    diagnostics: StreamDiagnostics,
}

impl NotebookClient {
    /// Create a new client with default endpoints and timeouts
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the notebook server (e.g., "http://localhost:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(&ClientConfig::builder(base_url).build())
    }

    /// Create a client from a configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(config.timeouts.connect_timeout());
        if let Some(timeout) = config.timeouts.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let base_url = Url::parse(&config.connection.base_url)?;
        let chat_url = base_url.join(&config.endpoints.chat)?;
        let content_url = base_url.join(&config.endpoints.content_stream)?;

        Ok(Self {
            client,
            base_url,
            chat_url,
            content_url,
            diagnostics: StreamDiagnostics::default(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the resolved URL of an endpoint
    pub fn endpoint_url(&self, endpoint: StreamEndpoint) -> &Url {
        match endpoint {
            StreamEndpoint::Chat => &self.chat_url,
            StreamEndpoint::ContentGeneration => &self.content_url,
        }
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Stream a chat reply into `sink`
    ///
    /// Every outcome, including transport failures, reaches `sink` as an
    /// event; the returned [`StreamOutcome`] only summarizes how it ended.
    pub async fn stream_chat<S>(&self, request: &ChatRequest, sink: &mut S) -> StreamOutcome
    where
        S: EventSink + ?Sized,
    {
        self.stream(StreamEndpoint::Chat, request, sink).await
    }

    /// Stream a chat reply, giving up when `cancel` resolves
    pub async fn stream_chat_until<S, C>(
        &self,
        request: &ChatRequest,
        sink: &mut S,
        cancel: C,
    ) -> StreamOutcome
    where
        S: EventSink + ?Sized,
        C: Future<Output = ()>,
    {
        self.stream_until(StreamEndpoint::Chat, request, sink, cancel)
            .await
    }

    /// Stream a chat reply as a `Stream` of events
    ///
    /// Spawns the request on the current tokio runtime.
    pub fn chat_events(&self, request: ChatRequest) -> EventStream {
        self.spawn_events(StreamEndpoint::Chat, request)
    }

    // =========================================================================
    // Content Generation
    // =========================================================================

    /// Stream generated content into `sink`
    pub async fn stream_generate<S>(
        &self,
        request: &GenerateRequest,
        sink: &mut S,
    ) -> StreamOutcome
    where
        S: EventSink + ?Sized,
    {
        self.stream(StreamEndpoint::ContentGeneration, request, sink)
            .await
    }

    /// Stream generated content, giving up when `cancel` resolves
    pub async fn stream_generate_until<S, C>(
        &self,
        request: &GenerateRequest,
        sink: &mut S,
        cancel: C,
    ) -> StreamOutcome
    where
        S: EventSink + ?Sized,
        C: Future<Output = ()>,
    {
        self.stream_until(StreamEndpoint::ContentGeneration, request, sink, cancel)
            .await
    }

    /// Stream generated content as a `Stream` of events
    ///
    /// Spawns the request on the current tokio runtime.
    pub fn generate_events(&self, request: GenerateRequest) -> EventStream {
        self.spawn_events(StreamEndpoint::ContentGeneration, request)
    }

    // =========================================================================
    // Shared stream path
    // =========================================================================

    /// POST `body` to `endpoint` and consume the streamed response
    pub async fn stream<B, S>(
        &self,
        endpoint: StreamEndpoint,
        body: &B,
        sink: &mut S,
    ) -> StreamOutcome
    where
        B: Serialize + ?Sized,
        S: EventSink + ?Sized,
    {
        self.stream_until(endpoint, body, sink, std::future::pending())
            .await
    }

    /// POST `body` to `endpoint` and consume the streamed response until
    /// it ends or `cancel` resolves
    #[instrument(skip(self, body, sink, cancel))]
    pub async fn stream_until<B, S, C>(
        &self,
        endpoint: StreamEndpoint,
        body: &B,
        sink: &mut S,
        cancel: C,
    ) -> StreamOutcome
    where
        B: Serialize + ?Sized,
        S: EventSink + ?Sized,
        C: Future<Output = ()>,
    {
        let url = self.endpoint_url(endpoint);
        debug!("Opening {} stream: {}", endpoint.name(), url);

        tokio::pin!(cancel);

        let request = self
            .client
            .post(url.clone())
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send();

        let response = tokio::select! {
            response = request => response,
            _ = &mut cancel => {
                debug!("Stream cancelled before response");
                return StreamOutcome::Cancelled;
            }
        };

        match response {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Stream response received");
                consume_until(response, &self.diagnostics, sink, cancel).await
            }
            Err(e) => {
                warn!(error = %e, "Stream request failed");
                sink.emit(StreamEvent::error(e.to_string()));
                StreamOutcome::Unreachable
            }
        }
    }

    fn spawn_events<B>(&self, endpoint: StreamEndpoint, body: B) -> EventStream
    where
        B: Serialize + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();

        tokio::spawn(async move {
            let closed = tx.clone();
            let mut sink = tx;
            client
                .stream_until(endpoint, &body, &mut sink, async move {
                    closed.closed().await
                })
                .await;
        });

        UnboundedReceiverStream::new(rx)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = NotebookClient::new("http://localhost:8000");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = NotebookClient::new("not a url");
        assert!(client.is_err());
    }

    #[test]
    fn test_endpoint_urls() {
        let client = NotebookClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.endpoint_url(StreamEndpoint::Chat).as_str(),
            "http://localhost:8000/api/v1/chat/"
        );
        assert_eq!(
            client.endpoint_url(StreamEndpoint::ContentGeneration).as_str(),
            "http://localhost:8000/api/v1/content/stream/"
        );
    }

    #[test]
    fn test_configured_endpoints() {
        let config = ClientConfig::builder("http://notebooks.local:9000")
            .chat_path("/v2/chat")
            .build();
        let client = NotebookClient::from_config(&config).unwrap();
        assert_eq!(
            client.endpoint_url(StreamEndpoint::Chat).as_str(),
            "http://notebooks.local:9000/v2/chat"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_error_event() {
        // bind and release a port so nothing is listening on it
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = NotebookClient::new(&format!("http://{}", addr)).unwrap();
        let mut events = Vec::new();

        let outcome = client
            .stream_chat(&ChatRequest::new(1, "hi"), &mut |e: StreamEvent| {
                events.push(e)
            })
            .await;

        assert_eq!(outcome, StreamOutcome::Unreachable);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
    }
}
