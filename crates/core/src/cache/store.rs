//! Filesystem cache store.
//!
//! Reads and deletes go through `tokio::fs`. Writes run on the blocking pool
//! and replace the target atomically: the bytes land in a temporary file in
//! the same directory, get synced, and are then renamed over the entry.

use std::io::{self, Write};
use std::path::Path;

use bytes::Bytes;
use tokio::fs;

use super::location::Location;
use crate::Error;

/// Store for cache entries addressed by [`Location`].
#[derive(Debug, Clone, Default)]
pub struct CacheStore;

impl CacheStore {
    pub fn new() -> Self {
        Self
    }

    /// Read the entry at `loc`.
    ///
    /// Returns None if nothing is stored there. Any other I/O failure is a
    /// `StoreFault`.
    pub async fn read(&self, loc: &Location) -> Result<Option<Bytes>, Error> {
        match fs::read(loc.path()).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::store_fault(loc.path(), e)),
        }
    }

    /// Write `bytes` to `loc`, replacing any existing entry.
    ///
    /// Concurrent readers see either the old or the new content in full. The
    /// temporary file is removed on every failure path, including when the
    /// calling future is dropped before the blocking task finishes.
    pub async fn write(&self, loc: &Location, bytes: Bytes) -> Result<(), Error> {
        let path = loc.path().to_path_buf();
        let target = path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
            .await
            .map_err(|e| Error::store_fault(&path, io::Error::other(e)))?
            .map_err(|e| Error::store_fault(&path, e))
    }

    /// Remove the entry at `loc`.
    ///
    /// Returns false if nothing was stored there.
    pub async fn delete(&self, loc: &Location) -> Result<bool, Error> {
        match fs::remove_file(loc.path()).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::store_fault(loc.path(), e)),
        }
    }
}

fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "location has no parent directory"))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".catcache-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    tmp.persist(target).map(drop).map_err(|e| e.error)
}
