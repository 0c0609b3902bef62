//! DELETE: remove the entry so the next GET goes back to the upstream.

use axum::response::{IntoResponse, Response};
use catcache_core::{CacheKey, ReadThroughCache};

use crate::error::HttpError;

/// Implementation of DELETE.
pub async fn delete_impl(cache: &ReadThroughCache, key: &CacheKey) -> Result<Response, HttpError> {
    cache.delete(key).await?;
    Ok("Deleted".into_response())
}
