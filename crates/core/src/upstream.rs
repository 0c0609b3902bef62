//! Contract with the upstream resource provider.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Error;
use crate::cache::CacheKey;

/// A source of canonical bytes for a key.
///
/// Implementations may be slow and may fail. Any error they return is treated
/// as a single fetch failure by the cache; the variant is kept for logging.
/// Retrying, if wanted, belongs inside the implementation.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> Result<Bytes, Error>;
}
