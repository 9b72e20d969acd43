//! In-process transporter that records requests instead of sending them.

use crate::error::TransportError;
use crate::http::{Headers, Method, Request, Response};
use crate::transport::{apply_default_user_agent, ensure_uri, Resource, Transporter, HTTP_USER_AGENT};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tracing::debug;

type Responder = Arc<dyn Fn(&RecordedRequest) -> Response + Send + Sync>;

/// A request as seen by [`MemoryTransporter`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub uri: String,
    pub method: Method,
    /// Headers as they would go on the wire, default user agent included.
    pub headers: Headers,
    pub body: Bytes,
    /// Whether the body came from a [`Resource`].
    pub streamed: bool,
}

/// Transporter that keeps every request in memory and answers from a
/// responder closure.
///
/// Service clients are exercised against it in tests: the responder plays
/// the server and [`MemoryTransporter::requests`] shows what was sent.
#[derive(Clone)]
pub struct MemoryTransporter {
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    responder: Responder,
    user_agent: String,
}

impl MemoryTransporter {
    /// Answer every request with an empty `200 OK`.
    pub fn new() -> Self {
        Self::with_responder(|_| Response::ok())
    }

    /// Answer every request with `responder(&request)`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Response + Send + Sync + 'static,
    {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            responder: Arc::new(responder),
            user_agent: HTTP_USER_AGENT.to_string(),
        }
    }

    /// Override the default user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Snapshot of the requests seen so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests recorded.
    pub async fn len(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Whether nothing has been recorded yet.
    pub async fn is_empty(&self) -> bool {
        self.requests.read().await.is_empty()
    }

    /// Forget every recorded request.
    pub async fn clear(&self) {
        self.requests.write().await.clear();
    }

    async fn record(&self, request: RecordedRequest) -> Response {
        debug!(
            "Recorded {} {} ({} bytes, streamed: {})",
            request.method,
            request.uri,
            request.body.len(),
            request.streamed
        );
        let response = (self.responder)(&request);
        self.requests.write().await.push(request);
        response
    }
}

impl Default for MemoryTransporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryTransporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransporter")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transporter for MemoryTransporter {
    async fn do_request(&self, request: Request) -> Result<Response, TransportError> {
        ensure_uri(&request.uri)?;
        let mut headers = request.headers;
        apply_default_user_agent(&mut headers, &self.user_agent);

        Ok(self
            .record(RecordedRequest {
                uri: request.uri,
                method: request.method,
                headers,
                body: request.body,
                streamed: false,
            })
            .await)
    }

    async fn do_request_with_resource(
        &self,
        uri: &str,
        method: Method,
        mut headers: Headers,
        resource: Resource,
    ) -> Result<Response, TransportError> {
        ensure_uri(uri)?;
        apply_default_user_agent(&mut headers, &self.user_agent);

        let mut opened = resource.open().await?;
        let mut body = Vec::new();
        opened.reader.read_to_end(&mut body).await?;

        Ok(self
            .record(RecordedRequest {
                uri: uri.to_string(),
                method,
                headers,
                body: Bytes::from(body),
                streamed: true,
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    #[tokio::test]
    async fn records_requests_in_order() {
        let transporter = MemoryTransporter::new();
        transporter.get("http://objects.local/a").await.unwrap();
        transporter
            .do_request(Request::new("http://objects.local/b").method(Method::Delete))
            .await
            .unwrap();

        let seen = transporter.requests().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].uri, "http://objects.local/a");
        assert_eq!(seen[1].method, Method::Delete);
        assert!(!seen[1].streamed);
    }

    #[tokio::test]
    async fn responder_sees_the_request() {
        let transporter = MemoryTransporter::with_responder(|request| {
            if request.uri.ends_with("/missing") {
                Response::new(StatusCode::NOT_FOUND)
            } else {
                Response::ok().body(request.body.clone())
            }
        });

        let echoed = transporter
            .do_request(Request::new("http://objects.local/echo").method(Method::Post).body("ping"))
            .await
            .unwrap();
        assert_eq!(echoed.text(), "ping");

        let missing = transporter.get("http://objects.local/missing").await.unwrap();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn custom_user_agent_applies_only_when_caller_sets_none() {
        let transporter = MemoryTransporter::new().user_agent("objectstore-cli/2.0");
        transporter.get("http://objects.local/").await.unwrap();
        transporter
            .do_request(Request::new("http://objects.local/").header("User-Agent", "mine"))
            .await
            .unwrap();

        let seen = transporter.requests().await;
        assert_eq!(seen[0].headers.get("User-Agent"), Some("objectstore-cli/2.0"));
        assert_eq!(seen[1].headers.get("User-Agent"), Some("mine"));
    }

    #[tokio::test]
    async fn clear_forgets_requests() {
        let transporter = MemoryTransporter::new();
        transporter.get("http://objects.local/").await.unwrap();
        assert_eq!(transporter.len().await, 1);
        transporter.clear().await;
        assert!(transporter.is_empty().await);
    }
}
