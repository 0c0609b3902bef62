//! Per-method request handlers.
//!
//! Each handler takes an already validated key and turns the cache outcome
//! into a response.

pub mod delete;
pub mod get;
pub mod put;

pub use delete::delete_impl;
pub use get::get_impl;
pub use put::put_impl;
