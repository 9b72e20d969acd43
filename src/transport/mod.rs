//! The transporter contract and its concrete implementations.
//!
//! A transporter relays one HTTP request per call and returns the server's
//! response. Service clients depend only on [`Transporter`], so the concrete
//! HTTP stack can be swapped (or replaced by [`MemoryTransporter`] in tests)
//! without touching them.

mod config;
mod hyper_client;
mod memory;
mod resource;

pub use self::config::TransportConfig;
pub use self::hyper_client::HyperTransporter;
pub use self::memory::{MemoryTransporter, RecordedRequest};
pub use self::resource::{BodyReader, OpenedResource, Resource};

use crate::error::TransportError;
use crate::http::{Headers, Method, Request, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// User agent sent by conforming transporters when the caller sets none.
pub const HTTP_USER_AGENT: &str = concat!("tether/", env!("CARGO_PKG_VERSION"));

/// Moves requests to a remote HTTP service and returns its responses.
///
/// Transporters deal only with the transport protocol, never the payload.
/// Every call relays exactly one request. Implementations must handle any
/// number of calls on the same instance, including concurrent ones.
#[async_trait]
pub trait Transporter: Send + Sync {
    /// Perform a request whose body is held in memory.
    ///
    /// [`Request::new`] supplies the defaults: `GET`, no headers, empty body.
    async fn do_request(&self, request: Request) -> Result<Response, TransportError>;

    /// Perform a request whose body is streamed from `resource`.
    ///
    /// Meant for large uploads and stream-to-stream copies. A
    /// [`Resource::Locator`] is opened with default options; a
    /// [`Resource::Reader`] is consumed without being reopened and is dropped
    /// by the transporter when the call returns.
    async fn do_request_with_resource(
        &self,
        uri: &str,
        method: Method,
        headers: Headers,
        resource: Resource,
    ) -> Result<Response, TransportError>;

    /// `GET uri` with no headers and an empty body.
    async fn get(&self, uri: &str) -> Result<Response, TransportError> {
        self.do_request(Request::new(uri)).await
    }
}

#[async_trait]
impl<T: Transporter + ?Sized> Transporter for Arc<T> {
    async fn do_request(&self, request: Request) -> Result<Response, TransportError> {
        (**self).do_request(request).await
    }

    async fn do_request_with_resource(
        &self,
        uri: &str,
        method: Method,
        headers: Headers,
        resource: Resource,
    ) -> Result<Response, TransportError> {
        (**self)
            .do_request_with_resource(uri, method, headers, resource)
            .await
    }
}

#[async_trait]
impl<T: Transporter + ?Sized> Transporter for Box<T> {
    async fn do_request(&self, request: Request) -> Result<Response, TransportError> {
        (**self).do_request(request).await
    }

    async fn do_request_with_resource(
        &self,
        uri: &str,
        method: Method,
        headers: Headers,
        resource: Resource,
    ) -> Result<Response, TransportError> {
        (**self)
            .do_request_with_resource(uri, method, headers, resource)
            .await
    }
}

/// Add `User-Agent: user_agent` unless the caller already set one.
pub fn apply_default_user_agent(headers: &mut Headers, user_agent: &str) {
    if !headers.contains("User-Agent") {
        headers.append("User-Agent", user_agent);
    }
}

pub(crate) fn ensure_uri(uri: &str) -> Result<(), TransportError> {
    if uri.trim().is_empty() {
        return Err(TransportError::InvalidUri(uri.to_string()));
    }
    Ok(())
}
