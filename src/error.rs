//! Transport error type.

use std::time::Duration;

/// Errors raised while relaying a request.
///
/// Error statuses returned by the server are not errors at this layer; they
/// arrive as a normal [`Response`](crate::http::Response).
#[derive(Debug)]
pub enum TransportError {
    /// The URI is empty or cannot be parsed.
    InvalidUri(String),
    /// The transporter does not speak this URI scheme.
    UnsupportedScheme(String),
    /// A header name or value was rejected by the HTTP layer.
    InvalidHeader { name: String },
    /// A resource locator names something other than a local file.
    UnsupportedLocator(String),
    /// A resource locator could not be opened.
    Resource {
        locator: String,
        source: std::io::Error,
    },
    /// Reading a request body failed.
    Io(std::io::Error),
    /// Connection or protocol failure.
    Http(String),
    /// The exchange did not finish in time.
    Timeout(Duration),
    /// The response body exceeded the configured limit.
    ResponseTooLarge { limit: usize },
    /// A configuration value is invalid.
    Config(String),
}

impl TransportError {
    pub(crate) fn http(err: impl std::fmt::Display) -> Self {
        TransportError::Http(err.to_string())
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::InvalidUri(uri) => write!(f, "invalid URI '{}'", uri),
            TransportError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported URI scheme '{}'", scheme)
            }
            TransportError::InvalidHeader { name } => write!(f, "invalid header '{}'", name),
            TransportError::UnsupportedLocator(locator) => {
                write!(f, "unsupported resource locator '{}'", locator)
            }
            TransportError::Resource { locator, source } => {
                write!(f, "cannot open resource '{}': {}", locator, source)
            }
            TransportError::Io(err) => write!(f, "I/O error: {}", err),
            TransportError::Http(msg) => write!(f, "HTTP error: {}", msg),
            TransportError::Timeout(after) => {
                write!(f, "request timed out after {}s", after.as_secs_f64())
            }
            TransportError::ResponseTooLarge { limit } => {
                write!(f, "response body exceeds {} bytes", limit)
            }
            TransportError::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Resource { source, .. } => Some(source),
            TransportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<hyper_util::client::legacy::Error> for TransportError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        // The client error only says "client error (Connect)"; the cause is
        // further down the chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        TransportError::Http(message)
    }
}
