//! PUT: store the request body as the entry, bypassing the upstream.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use catcache_core::{CacheKey, ReadThroughCache};

use crate::error::HttpError;

/// Implementation of PUT.
pub async fn put_impl(cache: &ReadThroughCache, key: &CacheKey, body: Bytes) -> Result<Response, HttpError> {
    cache.put(key, body).await?;
    Ok((StatusCode::CREATED, "Created").into_response())
}
