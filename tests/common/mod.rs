//! Local HTTP server used by the integration tests.
//!
//! Routes:
//! - `/status/{code}`: empty-ish reply with that status
//! - `/slow`: answers after three seconds
//! - `/large/{n}`: `n` bytes of body
//! - `/chunked/{n}`: `n` bytes sent chunked, without a content length
//! - `/meta`: carries a header value that is not plain ASCII
//! - anything else: JSON echo of the request (method, path, headers, body)

#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    /// Bind an ephemeral port and serve until the test runtime shuts down.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let io = TokioIo::new(stream);
                let counter = counter.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        handle(req)
                    });
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests the server has received.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

type ReplyBody = BoxBody<Bytes, Infallible>;

async fn handle(req: Request<Incoming>) -> Result<Response<ReplyBody>, hyper::Error> {
    let path = req.uri().path().to_string();

    if let Some(code) = path.strip_prefix("/status/") {
        let code: u16 = code.parse().unwrap_or(500);
        return Ok(reply(code, format!("status {}", code)));
    }
    if path == "/slow" {
        tokio::time::sleep(Duration::from_secs(3)).await;
        return Ok(reply(200, "slow"));
    }
    if let Some(len) = path.strip_prefix("/large/") {
        let len: usize = len.parse().unwrap_or(0);
        return Ok(reply(200, vec![b'x'; len]));
    }
    if let Some(len) = path.strip_prefix("/chunked/") {
        let len: usize = len.parse().unwrap_or(0);
        let frames: Vec<Result<Frame<Bytes>, Infallible>> = vec![b'x'; len]
            .chunks(256)
            .map(|chunk| Ok(Frame::data(Bytes::copy_from_slice(chunk))))
            .collect();
        let body = StreamBody::new(futures_util::stream::iter(frames)).boxed();
        return Ok(Response::builder().status(200).body(body).unwrap());
    }
    if path == "/meta" {
        let mut response = reply(200, "meta");
        response.headers_mut().append(
            "x-object-meta-name",
            hyper::header::HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap(),
        );
        return Ok(response);
    }

    let method = req.method().to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = req.collect().await?.to_bytes();

    let echo = serde_json::json!({
        "method": method,
        "path": path,
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
        "body_len": body.len(),
    });
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(echo.to_string())).boxed())
        .unwrap())
}

fn reply(status: u16, body: impl Into<Bytes>) -> Response<ReplyBody> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()).boxed())
        .unwrap()
}

/// First value of `name` in an echo's header list.
pub fn echoed_header(echo: &serde_json::Value, name: &str) -> Option<String> {
    echo["headers"]
        .as_array()?
        .iter()
        .find(|pair| pair[0].as_str().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .and_then(|pair| pair[1].as_str().map(str::to_string))
}

/// All values of `name` in an echo's header list, in order.
pub fn echoed_headers(echo: &serde_json::Value, name: &str) -> Vec<String> {
    echo["headers"]
        .as_array()
        .map(|pairs| {
            pairs
                .iter()
                .filter(|pair| pair[0].as_str().is_some_and(|n| n.eq_ignore_ascii_case(name)))
                .filter_map(|pair| pair[1].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
