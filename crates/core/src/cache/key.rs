//! Cache key extraction and validation.

use std::fmt;

/// Longest accepted key in bytes, leaving room for the `.jpg` suffix inside a
/// 255-byte filename.
pub const MAX_KEY_LEN: usize = 251;

/// Error type for key validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("empty key")]
    Empty,

    #[error("key too long: {0} bytes")]
    TooLong(usize),

    #[error("key contains a path separator: {0:?}")]
    Separator(String),

    #[error("key is a relative path component: {0:?}")]
    Traversal(String),

    #[error("key contains a control character: {0:?}")]
    ControlChar(String),
}

/// A validated identifier for one cached entry.
///
/// Holding a `CacheKey` means the value is non-empty and safe to use as a
/// single filename inside the cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CacheKey {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate(value)
    }
}

/// Turn a raw request path into a [`CacheKey`].
///
/// Rules:
/// 1. Strip a single leading `/`
/// 2. Reject the empty remainder
/// 3. Reject `.` and `..`
/// 4. Reject `/`, `\` and control characters anywhere
/// 5. Reject keys longer than [`MAX_KEY_LEN`] bytes
///
/// The key is used verbatim otherwise; no percent-decoding or case folding.
pub fn validate(raw_path: &str) -> Result<CacheKey, KeyError> {
    let candidate = raw_path.strip_prefix('/').unwrap_or(raw_path);

    if candidate.is_empty() {
        return Err(KeyError::Empty);
    }

    if candidate == "." || candidate == ".." {
        return Err(KeyError::Traversal(candidate.to_string()));
    }

    if candidate.contains(|c: char| c == '/' || c == '\\') {
        return Err(KeyError::Separator(candidate.to_string()));
    }

    if candidate.chars().any(char::is_control) {
        return Err(KeyError::ControlChar(candidate.escape_debug().to_string()));
    }

    if candidate.len() > MAX_KEY_LEN {
        return Err(KeyError::TooLong(candidate.len()));
    }

    Ok(CacheKey(candidate.to_string()))
}
