//! # Tether - pluggable HTTP transport
//!
//! Tether is the transport layer of a cloud-services client library. Service
//! clients (object storage, compute, identity...) build REST requests and
//! hand them to a [`Transporter`]; the transporter relays each one over HTTP
//! and returns the server's [`Response`]. Which HTTP stack does the work is
//! decided by whoever constructs the client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              Service clients (storage, compute, ...)         │
//! └──────────────────────────────────────────────────────────────┘
//!                               │ Request / Resource
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    trait Transporter                         │
//! │        do_request            do_request_with_resource        │
//! └──────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//!        ┌──────────────────┐            ┌──────────────────┐
//!        │ HyperTransporter │            │ MemoryTransporter│
//!        │  (hyper client)  │            │   (recording)    │
//!        └──────────────────┘            └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tether::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let transporter = HyperTransporter::with_defaults();
//!
//!     // In-memory body; method, headers and body default to GET, none, empty.
//!     let listing = transporter.get("http://127.0.0.1:8080/v1/containers").await?;
//!     println!("{}", listing.text());
//!
//!     // Streamed body: the file is opened by the transporter.
//!     let mut headers = Headers::new();
//!     headers.append("Content-Type", "application/octet-stream");
//!     let stored = transporter
//!         .do_request_with_resource(
//!             "http://127.0.0.1:8080/v1/containers/backups/disk.img",
//!             Method::Put,
//!             headers,
//!             Resource::locator("/var/backups/disk.img"),
//!         )
//!         .await?;
//!     assert!(stored.status.is_success());
//!     Ok(())
//! }
//! ```
//!
//! ## Request bodies
//!
//! [`Transporter::do_request`] sends a body held in memory.
//! [`Transporter::do_request_with_resource`] streams it from a [`Resource`]:
//! either a locator (path or `file://` URL) the transporter opens with
//! default options, or a reader the caller opened itself. Readers are moved
//! into the call and closed by the transporter.

pub mod error;
pub mod http;
pub mod transport;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::TransportError;
    pub use crate::http::{Headers, Method, Request, Response, StatusCode};
    pub use crate::transport::{
        HyperTransporter, MemoryTransporter, Resource, TransportConfig, Transporter,
        HTTP_USER_AGENT,
    };
}

// Re-export for convenience
pub use error::TransportError;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use transport::{
    HyperTransporter, MemoryTransporter, Resource, TransportConfig, Transporter, HTTP_USER_AGENT,
};
