//! Errors at the HTTP boundary.
//!
//! Every cache failure is answered as `404 Not Found`; only an unsupported
//! method gets its own status.

use axum::{
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use catcache_core::Error;

/// Structured errors for the catcache server.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The cache could not produce or change the entry.
    #[error("NOT_FOUND: {0}")]
    NotFound(#[from] Error),

    /// The request body could not be read in full.
    #[error("BODY_UNREADABLE: {0}")]
    Body(String),

    /// Anything other than GET, PUT or DELETE.
    #[error("METHOD_NOT_ALLOWED: {0}")]
    MethodNotAllowed(Method),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) | HttpError::Body(_) => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn log(&self) {
        match self {
            HttpError::NotFound(e @ Error::StoreFault { .. }) => {
                tracing::warn!(code = e.code(), error = %e, "request failed");
            }
            HttpError::NotFound(e) => tracing::debug!(code = e.code(), error = %e, "request failed"),
            HttpError::Body(msg) => tracing::info!("failed to read request body: {msg}"),
            HttpError::MethodNotAllowed(method) => tracing::debug!(%method, "method not allowed"),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.log();

        match self {
            HttpError::MethodNotAllowed(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, HeaderValue::from_static("GET, PUT, DELETE"))],
                "Method not allowed",
            )
                .into_response(),
            other => (other.status(), "Not Found").into_response(),
        }
    }
}
