//! Key Namespacing
//!
//! Builds the physical store key from a cache namespace and a logical key.

use crate::error::{CacheError, Result};

/// Separator between namespace segments and the logical key.
pub const KEY_SEPARATOR: char = ':';

// == Namespace ==
/// Builds the namespace of a cache from the shared key prefix and its name.
///
/// Each segment loses its trailing separators and gets exactly one back, so
/// `("app:", "users")` and `("app", "users:")` both give `"app:users:"`.
/// An empty prefix contributes no segment; an empty name is rejected.
pub fn namespace(key_prefix: &str, name: &str) -> Result<String> {
    let trimmed = name.trim_end_matches(KEY_SEPARATOR);
    if trimmed.is_empty() {
        return Err(CacheError::InvalidCacheName(name.to_string()));
    }

    let mut namespace = String::new();
    let prefix = key_prefix.trim_end_matches(KEY_SEPARATOR);
    if !prefix.is_empty() {
        namespace.push_str(prefix);
        namespace.push(KEY_SEPARATOR);
    }
    namespace.push_str(trimmed);
    namespace.push(KEY_SEPARATOR);

    Ok(namespace)
}

// == Physical Key ==
/// Joins a namespace built by [`namespace`] with a logical key.
pub fn physical_key(namespace: &str, key: &str) -> String {
    let mut physical = String::with_capacity(namespace.len() + key.len());
    physical.push_str(namespace);
    physical.push_str(key);
    physical
}
