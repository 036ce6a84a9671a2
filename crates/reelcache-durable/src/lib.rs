//! Best-effort durable key/value storage used to mirror view state.
//!
//! Backends are string-keyed and string-valued. They may reject writes
//! (quota) or be entirely unavailable; callers are expected to degrade to a
//! miss rather than surface the error.

mod error;
mod file;
mod memory;

use std::collections::BTreeMap;

pub use error::DurableError;
pub use file::FileKv;
pub use memory::{MemoryKv, NoopKv};

/// Result type for durable storage operations.
pub type Result<T> = std::result::Result<T, DurableError>;

/// String-keyed, string-valued durable storage.
pub trait DurableKv: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns a backend-specific error when storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns a backend-specific error when the write is rejected.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns a backend-specific error when storage cannot be written.
    fn remove(&self, key: &str) -> Result<()>;

    /// List every stored key in lexicographic order.
    ///
    /// # Errors
    /// Returns a backend-specific error when storage cannot be read.
    fn keys(&self) -> Result<Vec<String>>;

    /// List keys starting with `prefix`.
    ///
    /// # Errors
    /// Returns a backend-specific error when storage cannot be read.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

impl<T: DurableKv + ?Sized> DurableKv for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Bytes an entry set occupies for quota accounting (keys plus values).
pub(crate) fn footprint(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Check that replacing `key` with `value` keeps the store within `limit`.
pub(crate) fn check_quota(
    entries: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    limit: Option<usize>,
) -> Result<()> {
    let Some(limit) = limit else {
        return Ok(());
    };
    let existing = entries.get(key).map_or(0, |old| key.len() + old.len());
    let needed = footprint(entries) - existing + key.len() + value.len();
    if needed > limit {
        return Err(DurableError::QuotaExceeded {
            key: key.to_owned(),
            needed,
            limit,
        });
    }
    Ok(())
}
