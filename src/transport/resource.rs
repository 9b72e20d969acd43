//! Streamed request bodies.
//!
//! A [`Resource`] names body content that should not be held in memory:
//! either a locator the transporter opens itself, or a reader the caller has
//! already opened with whatever options it needed.
//!
//! A reader is moved into the request. The transporter owns it from then on
//! and drops it once the request completes or fails.

use crate::error::TransportError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

/// Boxed reader accepted as a request body.
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// Body content read from somewhere other than memory.
pub enum Resource {
    /// A filesystem path or `file://` URL, opened with default options.
    Locator(String),
    /// An already-open reader, consumed as-is.
    Reader(BodyReader),
}

/// A resource ready to be streamed.
pub struct OpenedResource {
    /// The body source, owned from here on.
    pub reader: BodyReader,
    /// Body length, when it can be known up front.
    pub len: Option<u64>,
}

impl std::fmt::Debug for OpenedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedResource")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// A path or `file://` URL to open when the request is sent.
    pub fn locator(locator: impl Into<String>) -> Self {
        Resource::Locator(locator.into())
    }

    /// A reader the caller has already opened.
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Resource::Reader(Box::new(reader))
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Resource::Locator(locator) => locator.clone(),
            Resource::Reader(_) => "<reader>".to_string(),
        }
    }

    /// Resolve into a reader.
    ///
    /// Locators are opened read-only; readers are handed back untouched.
    /// A locator naming a directory fails here rather than mid-request.
    pub async fn open(self) -> Result<OpenedResource, TransportError> {
        match self {
            Resource::Reader(reader) => Ok(OpenedResource { reader, len: None }),
            Resource::Locator(locator) => {
                let path = locator_path(&locator)?;
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|source| TransportError::Resource {
                        locator: locator.clone(),
                        source,
                    })?;
                let metadata = file
                    .metadata()
                    .await
                    .map_err(|source| TransportError::Resource {
                        locator: locator.clone(),
                        source,
                    })?;
                if metadata.is_dir() {
                    return Err(TransportError::Resource {
                        locator,
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "is a directory",
                        ),
                    });
                }
                // FIFOs and devices stream fine but have no usable length
                let len = metadata.is_file().then(|| metadata.len());
                Ok(OpenedResource {
                    reader: Box::new(file),
                    len,
                })
            }
        }
    }
}

/// Map a locator to a local path, rejecting non-file schemes.
fn locator_path(locator: &str) -> Result<&Path, TransportError> {
    if locator.is_empty() {
        return Err(TransportError::UnsupportedLocator(locator.to_string()));
    }
    match locator.split_once("://") {
        None => Ok(Path::new(locator)),
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("file") => {
            // file://localhost/path and file:///path both name /path
            let path = rest.strip_prefix("localhost").unwrap_or(rest);
            if path.starts_with('/') {
                Ok(Path::new(path))
            } else {
                Err(TransportError::UnsupportedLocator(locator.to_string()))
            }
        }
        Some(_) => Err(TransportError::UnsupportedLocator(locator.to_string())),
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Locator(locator) => f.debug_tuple("Locator").field(locator).finish(),
            Resource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<&str> for Resource {
    fn from(locator: &str) -> Self {
        Resource::Locator(locator.to_string())
    }
}

impl From<String> for Resource {
    fn from(locator: String) -> Self {
        Resource::Locator(locator)
    }
}

impl From<PathBuf> for Resource {
    fn from(path: PathBuf) -> Self {
        Resource::Locator(path.to_string_lossy().into_owned())
    }
}

impl From<tokio::fs::File> for Resource {
    fn from(file: tokio::fs::File) -> Self {
        Resource::reader(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn plain_and_file_url_locators_map_to_paths() {
        assert_eq!(locator_path("/tmp/object.bin").unwrap(), Path::new("/tmp/object.bin"));
        assert_eq!(locator_path("relative/object.bin").unwrap(), Path::new("relative/object.bin"));
        assert_eq!(locator_path("file:///tmp/object.bin").unwrap(), Path::new("/tmp/object.bin"));
        assert_eq!(
            locator_path("FILE://localhost/tmp/object.bin").unwrap(),
            Path::new("/tmp/object.bin")
        );
    }

    #[test]
    fn remote_locators_are_rejected() {
        for locator in ["http://example.com/object", "s3://bucket/key", "file://host/x", ""] {
            assert!(
                matches!(locator_path(locator), Err(TransportError::UnsupportedLocator(_))),
                "{locator}"
            );
        }
    }

    #[tokio::test]
    async fn open_locator_reports_length() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"segment-0001").unwrap();

        let opened = Resource::from(file.path().to_path_buf()).open().await.unwrap();
        assert_eq!(opened.len, Some(12));

        let mut body = String::new();
        let mut reader = opened.reader;
        reader.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "segment-0001");
    }

    #[tokio::test]
    async fn open_missing_locator_fails() {
        let err = Resource::locator("/definitely/not/here.bin").open().await.unwrap_err();
        match err {
            TransportError::Resource { locator, source } => {
                assert_eq!(locator, "/definitely/not/here.bin");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn open_directory_locator_fails() {
        let dir = tempfile::tempdir().unwrap();
        let locator = dir.path().to_string_lossy().into_owned();

        let err = Resource::locator(locator.clone()).open().await.unwrap_err();
        match err {
            TransportError::Resource { locator: failed, source } => {
                assert_eq!(failed, locator);
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn opened_resource_debug_hides_reader() {
        let opened = OpenedResource {
            reader: Box::new(tokio::io::empty()),
            len: Some(3),
        };
        assert_eq!(format!("{:?}", opened), "OpenedResource { len: Some(3), .. }");
    }

    #[tokio::test]
    async fn open_reader_passes_it_through() {
        let mock = tokio_test::io::Builder::new().read(b"streamed").build();
        let opened = Resource::reader(mock).open().await.unwrap();
        assert_eq!(opened.len, None);

        let mut body = Vec::new();
        let mut reader = opened.reader;
        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"streamed");
    }
}
