//! The read-through protocol.
//!
//! GET checks the store first and falls back to the upstream on a miss,
//! persisting what it fetched. PUT and DELETE act on the store directly and
//! never touch the upstream.

use std::sync::Arc;

use bytes::Bytes;

use super::flight::Flights;
use super::key::CacheKey;
use super::location::{Location, Locator};
use super::store::CacheStore;
use crate::Error;
use crate::config::{AppConfig, ConfigError};
use crate::upstream::Upstream;

/// Successful outcome of a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Served from the store.
    Hit(Bytes),
    /// Fetched from the upstream on this request.
    Filled(Bytes),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            Lookup::Hit(b) | Lookup::Filled(b) => b,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Lookup::Hit(b) | Lookup::Filled(b) => b,
        }
    }
}

/// Cache orchestrator tying addressing, storage and the upstream together.
pub struct ReadThroughCache {
    locator: Locator,
    store: CacheStore,
    upstream: Arc<dyn Upstream>,
    flights: Option<Flights<Result<Lookup, Error>>>,
}

impl ReadThroughCache {
    /// Create a cache rooted at `locator` with single-flight fetches enabled.
    pub fn new(locator: Locator, upstream: Arc<dyn Upstream>) -> Self {
        Self { locator, store: CacheStore::new(), upstream, flights: Some(Flights::new()) }
    }

    /// Build a cache from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no cache directory is configured.
    pub fn from_config(config: &AppConfig, upstream: Arc<dyn Upstream>) -> Result<Self, ConfigError> {
        let locator = Locator::new(config.require_cache_dir()?);
        let cache = Self::new(locator, upstream);
        Ok(if config.single_flight { cache } else { cache.without_single_flight() })
    }

    /// Let concurrent misses on one key each call the upstream.
    pub fn without_single_flight(mut self) -> Self {
        self.flights = None;
        self
    }

    /// Look up `key`, filling the cache from the upstream on a miss.
    ///
    /// A store read fault counts as a miss. A failed write after a successful
    /// fetch is logged and the fetched bytes are still returned. With
    /// single-flight on, concurrent misses on one key share a single fetch and
    /// all receive its outcome.
    ///
    /// # Errors
    ///
    /// Returns the upstream's error if the entry is absent and the fetch
    /// fails.
    pub async fn get(&self, key: &CacheKey) -> Result<Lookup, Error> {
        let loc = self.locator.locate(key);

        if let Some(bytes) = self.read_or_miss(key, &loc).await {
            return Ok(Lookup::Hit(bytes));
        }

        match &self.flights {
            Some(flights) => flights.run(key, || self.recheck_and_fill(key, &loc)).await,
            None => self.fill(key, &loc).await,
        }
    }

    /// Store `bytes` under `key`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreFault` if the write fails.
    pub async fn put(&self, key: &CacheKey, bytes: Bytes) -> Result<(), Error> {
        let loc = self.locator.locate(key);
        let len = bytes.len();
        self.store.write(&loc, bytes).await?;
        tracing::debug!(key = %key, bytes = len, "entry written");
        Ok(())
    }

    /// Remove the entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns `CacheMiss` if nothing was stored, or `StoreFault` if removal
    /// fails.
    pub async fn delete(&self, key: &CacheKey) -> Result<(), Error> {
        let loc = self.locator.locate(key);
        if self.store.delete(&loc).await? {
            tracing::debug!(key = %key, "entry deleted");
            Ok(())
        } else {
            Err(Error::CacheMiss(key.to_string()))
        }
    }

    /// An earlier flight may have completed between the first read and
    /// joining this one.
    async fn recheck_and_fill(&self, key: &CacheKey, loc: &Location) -> Result<Lookup, Error> {
        if let Some(bytes) = self.read_or_miss(key, loc).await {
            tracing::debug!(key = %key, "filled by concurrent request");
            return Ok(Lookup::Hit(bytes));
        }
        self.fill(key, loc).await
    }

    async fn fill(&self, key: &CacheKey, loc: &Location) -> Result<Lookup, Error> {
        let bytes = self.upstream.fetch(key).await.map_err(|e| {
            tracing::info!(key = %key, code = e.code(), error = %e, "upstream fetch failed");
            if e.is_fetch_failure() { e } else { Error::FetchFailed(e.to_string()) }
        })?;

        match self.store.write(loc, bytes.clone()).await {
            Ok(()) => tracing::debug!(key = %key, bytes = bytes.len(), "cache filled"),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to persist fetched entry"),
        }

        Ok(Lookup::Filled(bytes))
    }

    async fn read_or_miss(&self, key: &CacheKey, loc: &Location) -> Option<Bytes> {
        match self.store.read(loc).await {
            Ok(Some(bytes)) => {
                tracing::debug!(key = %key, "cache hit");
                Some(bytes)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                // Answered as a miss, but logged so persistent faults stay visible.
                tracing::warn!(key = %key, error = %e, "store read failed, treating as miss");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::validate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Upstream that serves fixed bytes and counts calls.
    struct FixedUpstream {
        body: Option<Bytes>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedUpstream {
        fn serving(body: &'static [u8]) -> Arc<Self> {
            Arc::new(Self { body: Some(Bytes::from_static(body)), delay: Duration::ZERO, calls: AtomicUsize::new(0) })
        }

        fn slow(body: &'static [u8], delay: Duration) -> Arc<Self> {
            Arc::new(Self { body: Some(Bytes::from_static(body)), delay, calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { body: None, delay: Duration::ZERO, calls: AtomicUsize::new(0) })
        }

        fn slow_failing(delay: Duration) -> Arc<Self> {
            Arc::new(Self { body: None, delay, calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Upstream for FixedUpstream {
        async fn fetch(&self, key: &CacheKey) -> Result<Bytes, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.body.clone().ok_or_else(|| Error::HttpError(format!("status 404 for {key}")))
        }
    }

    fn cache_in(dir: &tempfile::TempDir, upstream: Arc<FixedUpstream>) -> ReadThroughCache {
        ReadThroughCache::new(Locator::new(dir.path()), upstream)
    }

    #[tokio::test]
    async fn test_miss_fills_then_hits() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::serving(b"\xFF\xD8cat");
        let cache = cache_in(&dir, upstream.clone());
        let key = validate("/200").unwrap();

        let first = cache.get(&key).await.unwrap();
        assert_eq!(first, Lookup::Filled(Bytes::from_static(b"\xFF\xD8cat")));
        assert!(dir.path().join("200.jpg").exists());

        let second = cache.get(&key).await.unwrap();
        assert!(second.is_hit());
        assert_eq!(second.into_bytes(), Bytes::from_static(b"\xFF\xD8cat"));
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_hit_does_not_call_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::failing();
        let cache = cache_in(&dir, upstream.clone());
        let key = validate("/abc").unwrap();

        cache.put(&key, Bytes::from_static(b"stored")).await.unwrap();

        let found = cache.get(&key).await.unwrap();
        assert_eq!(found.bytes(), &Bytes::from_static(b"stored"));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_miss_with_failing_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::failing();
        let cache = cache_in(&dir, upstream.clone());

        let result = cache.get(&validate("/abc").unwrap()).await;
        assert!(matches!(result, Err(ref e) if e.is_fetch_failure()));
        assert!(!dir.path().join("abc.jpg").exists());
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::failing();
        let cache = cache_in(&dir, upstream.clone());
        let key = validate("/abc").unwrap();

        assert!(cache.get(&key).await.is_err());
        assert!(cache.get(&key).await.is_err());
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_store_fault_degrades_to_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::serving(b"fresh");
        let cache = cache_in(&dir, upstream.clone());
        let key = validate("/abc").unwrap();

        // A directory where the entry should be makes both read and write fail.
        std::fs::create_dir(dir.path().join("abc.jpg")).unwrap();

        let found = cache.get(&key).await.unwrap();
        assert_eq!(found, Lookup::Filled(Bytes::from_static(b"fresh")));
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, FixedUpstream::failing());
        let key = validate("/abc").unwrap();

        cache.put(&key, Bytes::from_static(b"same")).await.unwrap();
        cache.put(&key, Bytes::from_static(b"same")).await.unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(cache.get(&key).await.unwrap().into_bytes(), Bytes::from_static(b"same"));
    }

    #[tokio::test]
    async fn test_put_fault() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new(dir.path().join("missing"));
        let cache = ReadThroughCache::new(locator, FixedUpstream::failing());

        let result = cache.put(&validate("/abc").unwrap(), Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(Error::StoreFault { .. })));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::failing();
        let cache = cache_in(&dir, upstream.clone());
        let key = validate("/abc").unwrap();

        cache.put(&key, Bytes::from_static(b"data")).await.unwrap();
        cache.delete(&key).await.unwrap();

        assert!(cache.get(&key).await.is_err());
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, FixedUpstream::failing());

        let result = cache.delete(&validate("/abc").unwrap()).await;
        assert!(matches!(result, Err(Error::CacheMiss(ref k)) if k == "abc"));
    }

    #[tokio::test]
    async fn test_concurrent_misses_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::slow(b"cat", Duration::from_millis(50));
        let cache = Arc::new(cache_in(&dir, upstream.clone()));
        let key = validate("/200").unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move { cache.get(&key).await })
            })
            .collect();

        for task in tasks {
            let found = task.await.unwrap().unwrap();
            assert_eq!(found.into_bytes(), Bytes::from_static(b"cat"));
        }
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_failure() {
        let dir = tempfile::tempdir().unwrap();
        let delay = Duration::from_millis(200);
        let upstream = FixedUpstream::slow_failing(delay);
        let cache = Arc::new(cache_in(&dir, upstream.clone()));
        let key = validate("/500").unwrap();

        let start = std::time::Instant::now();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move { cache.get(&key).await })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap();
            assert!(matches!(result, Err(Error::HttpError(_))));
        }
        assert_eq!(upstream.calls(), 1);
        assert!(start.elapsed() < delay * 4, "waiters were serialized: {:?}", start.elapsed());
        assert!(!dir.path().join("500.jpg").exists());

        // The failure is not remembered once the flight is over.
        assert!(cache.get(&key).await.is_err());
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_without_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = FixedUpstream::slow(b"cat", Duration::from_millis(50));
        let cache = Arc::new(cache_in(&dir, upstream.clone()).without_single_flight());
        let key = validate("/200").unwrap();

        let (a, b) = tokio::join!(cache.get(&key), cache.get(&key));
        assert_eq!(a.unwrap().into_bytes(), Bytes::from_static(b"cat"));
        assert_eq!(b.unwrap().into_bytes(), Bytes::from_static(b"cat"));
        assert_eq!(upstream.calls(), 2);

        let stored = std::fs::read(dir.path().join("200.jpg")).unwrap();
        assert_eq!(stored, b"cat");
    }
}
