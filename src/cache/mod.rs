//! Cache Module
//!
//! Typed read-through caches with key namespacing, TTLs and loaders.

mod instance;
mod key;
mod options;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use instance::Cache;
pub use key::{namespace, physical_key, KEY_SEPARATOR};
pub use options::{CacheOptions, ItemOptions, Loader};
