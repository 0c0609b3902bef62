//! Filesystem-backed read-through cache.
//!
//! This module provides the pieces behind every request:
//!
//! - Key validation: raw request path to a safe single filename
//! - Addressing: key to `<root>/<key>.jpg`, no I/O
//! - Store: read, atomic write and delete against the filesystem
//! - Read-through: cache-or-fetch protocol with optional single-flight

pub mod flight;
pub mod key;
pub mod location;
pub mod read_through;
pub mod store;

pub use crate::Error;

pub use key::{CacheKey, KeyError, validate};
pub use location::{EXTENSION, Location, Locator, MEDIA_TYPE};
pub use read_through::{Lookup, ReadThroughCache};
pub use store::CacheStore;
