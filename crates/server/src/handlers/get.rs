//! GET: serve from the cache, filling it from the upstream on a miss.

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use catcache_core::cache::MEDIA_TYPE;
use catcache_core::{CacheKey, ReadThroughCache};

use crate::error::HttpError;

/// Implementation of GET.
pub async fn get_impl(cache: &ReadThroughCache, key: &CacheKey) -> Result<Response, HttpError> {
    let found = cache.get(key).await?;

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE))],
        found.into_bytes(),
    )
        .into_response())
}
