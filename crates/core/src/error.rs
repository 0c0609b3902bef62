//! Unified error types for catcache.
//!
//! Every failure carries a stable code prefix in its display form. The
//! server collapses all of them into a single "not found" response.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::key::KeyError;

/// Unified error types for the cache service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The request target did not yield a usable key.
    #[error("INVALID_KEY: {0}")]
    InvalidKey(KeyError),

    /// No cache entry exists for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Local storage I/O failed for a reason other than absence.
    #[error("STORE_FAULT: {}: {source}", path.display())]
    StoreFault {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Upstream URL could not be built.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Upstream did not answer in time.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Upstream response body too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Upstream answered with a non-success status or the transfer broke.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Any other upstream failure.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),
}

impl Error {
    pub(crate) fn store_fault(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::StoreFault { path: path.into(), source: Arc::new(source) }
    }

    /// Whether this error came from the upstream provider.
    ///
    /// The read-through protocol does not distinguish between these; the
    /// individual variants only exist for diagnostics.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::FetchTimeout(_)
                | Error::FetchTooLarge(_)
                | Error::HttpError(_)
                | Error::FetchFailed(_)
        )
    }

    /// Short machine-readable code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidKey(_) => "INVALID_KEY",
            Error::CacheMiss(_) => "CACHE_MISS",
            Error::StoreFault { .. } => "STORE_FAULT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::FetchFailed(_) => "FETCH_FAILED",
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Error::InvalidKey(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("abc".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_store_fault_display_includes_path() {
        let err = Error::store_fault(
            "/tmp/c/abc.jpg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.starts_with("STORE_FAULT"));
        assert!(text.contains("/tmp/c/abc.jpg"));
        assert_eq!(err.code(), "STORE_FAULT");
    }

    #[test]
    fn test_clone_keeps_source() {
        let err = Error::store_fault("/tmp/c/abc.jpg", std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let copy = err.clone();
        assert_eq!(copy.to_string(), err.to_string());
        assert!(std::error::Error::source(&copy).is_some());
    }

    #[test]
    fn test_fetch_failure_classification() {
        assert!(Error::HttpError("status 404".into()).is_fetch_failure());
        assert!(Error::FetchTimeout("slow".into()).is_fetch_failure());
        assert!(Error::FetchTooLarge("big".into()).is_fetch_failure());
        assert!(!Error::CacheMiss("abc".into()).is_fetch_failure());
        assert!(!Error::InvalidKey(KeyError::Empty).is_fetch_failure());
    }
}
