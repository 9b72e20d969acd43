//! Transient request and response types shared by all transporters.

mod headers;
mod request;
mod response;

pub use headers::Headers;
pub use request::{Method, Request};
pub use response::{Response, StatusCode};
