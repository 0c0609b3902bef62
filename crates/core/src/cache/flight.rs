//! Single-flight: one upstream fetch per key, however many callers ask.
//!
//! The first caller for a key runs the work; everyone who joins while it is
//! running waits for and receives the same outcome, failures included. The
//! entry is dropped once the work completes, so a later caller starts fresh.
//! If the running caller is cancelled, one of the waiters takes over.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use super::key::CacheKey;

#[derive(Debug)]
pub struct Flights<T> {
    calls: Mutex<HashMap<CacheKey, Arc<OnceCell<T>>>>,
}

impl<T> Default for Flights<T> {
    fn default() -> Self {
        Self { calls: Mutex::new(HashMap::new()) }
    }
}

impl<T: Clone> Flights<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key` unless a call for it is already in flight, in
    /// which case wait for that call and return its outcome.
    ///
    /// Other keys are never blocked.
    pub async fn run<F, Fut>(&self, key: &CacheKey, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = self.calls.lock().await.entry(key.clone()).or_default().clone();

        let outcome = cell.get_or_init(work).await.clone();

        let mut calls = self.calls.lock().await;
        if calls.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(key);
        }
        outcome
    }

    /// Number of keys with a call running or awaited.
    pub async fn in_flight(&self) -> usize {
        self.calls.lock().await.len()
    }
}
