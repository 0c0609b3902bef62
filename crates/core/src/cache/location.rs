//! Storage addressing: where a key lives on disk.

use std::path::{Path, PathBuf};

use super::key::CacheKey;

/// Filename suffix for every stored entry.
pub const EXTENSION: &str = "jpg";

/// Media type served for every stored entry.
pub const MEDIA_TYPE: &str = "image/jpeg";

/// Absolute on-disk location of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location(PathBuf);

impl Location {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Maps keys to locations under a single root directory.
#[derive(Debug, Clone)]
pub struct Locator {
    root: PathBuf,
}

impl Locator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Compute `<root>/<key>.jpg`.
    ///
    /// A validated key is a single path component, so the result is always a
    /// direct child of the root and distinct keys give distinct paths.
    pub fn locate(&self, key: &CacheKey) -> Location {
        Location(self.root.join(format!("{key}.{EXTENSION}")))
    }
}
