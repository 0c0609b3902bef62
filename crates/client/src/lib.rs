//! Client code for catcache.
//!
//! This crate provides the HTTP upstream that fills the cache on a miss.

pub mod fetch;

pub use fetch::{FetchConfig, HttpUpstream, UrlError, canonicalize, resource_url};
