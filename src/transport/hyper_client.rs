//! Plain-HTTP transporter on top of the hyper client.

use crate::error::TransportError;
use crate::http::{Headers, Method, Request, Response};
use crate::transport::{
    apply_default_user_agent, ensure_uri, BodyReader, Resource, TransportConfig, Transporter,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited, StreamBody};
use hyper::body::Frame;
use hyper::header::{HeaderName, HeaderValue};
use hyper::Uri;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

type RequestBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Side channel for a body streamed from a reader.
///
/// hyper only reports a body failure as text, so the reader's own error is
/// parked in `failure`. `released` resolves once hyper drops the body, i.e.
/// after the last chunk went out.
struct StreamWatch {
    failure: Arc<Mutex<Option<std::io::Error>>>,
    released: oneshot::Receiver<()>,
}

/// Transporter that speaks HTTP/1.1 over plain TCP using hyper.
///
/// Cloning is cheap; clones share the underlying client.
#[derive(Clone)]
pub struct HyperTransporter {
    client: Client<HttpConnector, RequestBody>,
    config: Arc<TransportConfig>,
}

impl HyperTransporter {
    /// Create a transporter with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(config.connect_timeout_duration());
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Create a transporter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TransportConfig::default())
    }

    /// The configuration this transporter was built with.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn send(
        &self,
        target: Uri,
        method: Method,
        headers: Headers,
        body: RequestBody,
        watch: Option<StreamWatch>,
    ) -> Result<Response, TransportError> {
        let request = build_request(target, method, headers, body)?;
        let uri = request.uri().clone();
        debug!("Sending {} {}", method, uri);

        let (failure, released) = match watch {
            Some(watch) => (Some(watch.failure), Some(watch.released)),
            None => (None, None),
        };

        let result = match (self.config.request_timeout_duration(), released) {
            (None, _) => self.exchange(request).await,
            (Some(limit), None) => tokio::time::timeout(limit, self.exchange(request))
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            // Streamed uploads may take as long as they need; the clock
            // starts once the whole body has been handed to hyper.
            (Some(limit), Some(released)) => {
                let deadline = async move {
                    let _ = released.await;
                    tokio::time::sleep(limit).await;
                };
                tokio::select! {
                    result = self.exchange(request) => result,
                    _ = deadline => Err(TransportError::Timeout(limit)),
                }
            }
        };

        let result = match (result, failure) {
            (Err(e), Some(failure)) => match failure.lock().ok().and_then(|mut slot| slot.take()) {
                Some(io) => Err(TransportError::Io(io)),
                None => Err(e),
            },
            (result, _) => result,
        };

        match &result {
            Ok(response) => debug!("{} {} -> {}", method, uri, response.status),
            Err(e) => warn!("{} {} failed: {}", method, uri, e),
        }
        result
    }

    async fn exchange(
        &self,
        request: hyper::Request<RequestBody>,
    ) -> Result<Response, TransportError> {
        let response = self.client.request(request).await?;
        let (parts, body) = response.into_parts();

        let limit = self.config.max_response_size;
        let body = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    TransportError::ResponseTooLarge { limit }
                } else {
                    TransportError::http(e)
                }
            })?
            .to_bytes();

        Ok(Response {
            status: parts.status.into(),
            headers: Headers::from(&parts.headers),
            body,
        })
    }
}

impl std::fmt::Debug for HyperTransporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transporter for HyperTransporter {
    async fn do_request(&self, request: Request) -> Result<Response, TransportError> {
        let Request {
            uri,
            method,
            mut headers,
            body,
        } = request;
        let target = parse_target(&uri)?;
        apply_default_user_agent(&mut headers, &self.config.user_agent);

        let body = Full::new(body).map_err(|never| match never {}).boxed_unsync();
        self.send(target, method, headers, body, None).await
    }

    async fn do_request_with_resource(
        &self,
        uri: &str,
        method: Method,
        mut headers: Headers,
        resource: Resource,
    ) -> Result<Response, TransportError> {
        let target = parse_target(uri)?;
        apply_default_user_agent(&mut headers, &self.config.user_agent);

        debug!("Opening request body from {}", resource.describe());
        let opened = resource.open().await?;
        if let Some(len) = opened.len {
            if !headers.contains("Content-Length") {
                headers.append("Content-Length", len.to_string());
            }
        }

        let (body, watch) = stream_body(opened.reader, self.config.effective_chunk_size());
        self.send(target, method, headers, body, Some(watch)).await
    }
}

/// Parse `uri`, accepting only `http` targets.
fn parse_target(uri: &str) -> Result<Uri, TransportError> {
    ensure_uri(uri)?;
    let target: Uri = uri
        .parse()
        .map_err(|_| TransportError::InvalidUri(uri.to_string()))?;

    match target.scheme_str() {
        Some(scheme) if scheme.eq_ignore_ascii_case("http") => {}
        Some(scheme) => return Err(TransportError::UnsupportedScheme(scheme.to_string())),
        None => return Err(TransportError::InvalidUri(uri.to_string())),
    }
    if target.host().is_none() {
        return Err(TransportError::InvalidUri(uri.to_string()));
    }
    Ok(target)
}

fn build_request(
    target: Uri,
    method: Method,
    headers: Headers,
    body: RequestBody,
) -> Result<hyper::Request<RequestBody>, TransportError> {
    let mut builder = hyper::Request::builder()
        .method(hyper::Method::from(method))
        .uri(target);

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| TransportError::InvalidHeader { name })?;
        builder = builder.header(header_name, header_value);
    }

    builder.body(body).map_err(TransportError::http)
}

/// Body that pulls `chunk_size` reads from `reader` as hyper asks for data.
///
/// Without a `Content-Length` header hyper sends it chunked.
fn stream_body(reader: BodyReader, chunk_size: usize) -> (RequestBody, StreamWatch) {
    let failure = Arc::new(Mutex::new(None));
    let slot = failure.clone();
    let (release, released) = oneshot::channel::<()>();

    let frames = ReaderStream::with_capacity(reader, chunk_size).map(move |chunk| {
        // Dropped together with the body.
        let _release = &release;
        chunk.map(Frame::data).map_err(|e| {
            let reported = std::io::Error::new(e.kind(), e.to_string());
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(e);
            }
            reported
        })
    });

    let body = StreamBody::new(frames).boxed_unsync();
    (body, StreamWatch { failure, released })
}
