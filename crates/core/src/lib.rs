//! Core types and shared functionality for catcache.
//!
//! This crate provides:
//! - Key validation and on-disk addressing
//! - Filesystem cache store with atomic writes
//! - The read-through orchestrator and the upstream contract
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod upstream;

pub use cache::{CacheKey, Lookup, ReadThroughCache};
pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use error::Error;
pub use upstream::Upstream;
