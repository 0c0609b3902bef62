//! HTTP front end.
//!
//! This module defines the router that sends every request, whatever its
//! path, through one dispatcher: method check, key validation, then the
//! per-method handler.
use std::sync::Arc;

use axum::{
    Router,
    body::to_bytes,
    extract::{Request, State},
    http::Method,
    response::Response,
};
use catcache_core::{Error, ReadThroughCache, cache};
use tower_http::trace::TraceLayer;

use crate::error::HttpError;
use crate::handlers::{delete_impl, get_impl, put_impl};

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    cache: Arc<ReadThroughCache>,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(cache: ReadThroughCache, max_body_bytes: usize) -> Self {
        Self { cache: Arc::new(cache), max_body_bytes }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Result<Response, HttpError> {
    let method = request.method().clone();
    if !matches!(method, Method::GET | Method::PUT | Method::DELETE) {
        return Err(HttpError::MethodNotAllowed(method));
    }

    let key = cache::validate(request.uri().path()).map_err(Error::from)?;

    match method {
        Method::GET => get_impl(&state.cache, &key).await,
        Method::PUT => {
            let body = to_bytes(request.into_body(), state.max_body_bytes)
                .await
                .map_err(|e| HttpError::Body(e.to_string()))?;
            put_impl(&state.cache, &key, body).await
        }
        _ => delete_impl(&state.cache, &key).await,
    }
}
