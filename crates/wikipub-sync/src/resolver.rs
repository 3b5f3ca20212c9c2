//! Content resolution for page sources and URI-valued properties.
//!
//! A locator is either an absolute URI (`file:`, `http:`, `https:`) or a
//! filesystem path, relative paths being resolved against a base directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;
use ureq::Agent;
use url::Url;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Error reading a locator.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// File could not be read.
    #[error("cannot read {}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// HTTP request failed (network error, timeout, etc).
    #[error("request to {url} failed")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: ureq::Error,
    },

    /// Server returned an error status.
    #[error("fetching {url} returned HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// `file:` URI that does not map to a local path.
    #[error("invalid file URI: {0}")]
    InvalidFileUri(String),

    /// Scheme other than `file`, `http` or `https`.
    #[error("unsupported URI scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Turns a locator into readable text.
pub trait ContentResolver {
    /// Read the content behind `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the content cannot be read.
    fn resolve(&self, locator: &str) -> Result<String, ResolveError>;
}

/// Parse a value as an absolute URI.
///
/// Returns `None` for values without a scheme (`v1.2`, `Home`,
/// `children/install.wiki`) and for Windows drive paths (`C:\docs`),
/// which are not links.
#[must_use]
pub fn parse_uri(value: &str) -> Option<Url> {
    let url = Url::parse(value).ok()?;
    if url.scheme().len() < 2 {
        return None;
    }
    Some(url)
}

/// Resolver for `file:`, `http:` and `https:` URIs and local paths.
pub struct UriResolver {
    agent: Agent,
    base_dir: PathBuf,
}

impl UriResolver {
    /// Create a resolver reading relative paths from `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_dir: base_dir.into(),
        }
    }

    fn read_file(path: &Path) -> Result<String, ResolveError> {
        std::fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn fetch(&self, url: &str) -> Result<String, ResolveError> {
        debug!(url, "Fetching remote content");

        let http_err = |source| ResolveError::Http {
            url: url.to_owned(),
            source,
        };
        let response = self.agent.get(url).call().map_err(http_err)?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(ResolveError::HttpStatus {
                url: url.to_owned(),
                status,
            });
        }

        response.into_body().read_to_string().map_err(http_err)
    }
}

impl ContentResolver for UriResolver {
    fn resolve(&self, locator: &str) -> Result<String, ResolveError> {
        let Some(url) = parse_uri(locator) else {
            return Self::read_file(&self.base_dir.join(locator));
        };

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| ResolveError::InvalidFileUri(locator.to_owned()))?;
                Self::read_file(&path)
            }
            "http" | "https" => self.fetch(url.as_str()),
            other => Err(ResolveError::UnsupportedScheme(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_uri_with_scheme() {
        let url = parse_uri("https://example.org/notes.txt").unwrap();
        assert_eq!(url.scheme(), "https");
        assert!(parse_uri("file:///tmp/notes.txt").is_some());
    }

    #[test]
    fn test_parse_uri_plain_values() {
        assert!(parse_uri("v1.2").is_none());
        assert!(parse_uri("Home").is_none());
        assert!(parse_uri("children/install.wiki").is_none());
        assert!(parse_uri("").is_none());
    }

    #[test]
    fn test_parse_uri_windows_drive_is_not_uri() {
        assert!(parse_uri(r"C:\docs\install.wiki").is_none());
    }

    #[test]
    fn test_resolve_relative_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("install.wiki"), "h1. Install").unwrap();

        let resolver = UriResolver::new(dir.path());
        assert_eq!(resolver.resolve("install.wiki").unwrap(), "h1. Install");
    }

    #[test]
    fn test_resolve_file_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "release notes").unwrap();
        let uri = Url::from_file_path(&path).unwrap();

        let resolver = UriResolver::new("/unused");
        assert_eq!(resolver.resolve(uri.as_str()).unwrap(), "release notes");
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = TempDir::new().unwrap();
        let resolver = UriResolver::new(dir.path());
        let err = resolver.resolve("missing.wiki").unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let resolver = UriResolver::new("/unused");
        let err = resolver.resolve("mailto:docs@example.org").unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedScheme(ref s) if s == "mailto"));
    }
}
