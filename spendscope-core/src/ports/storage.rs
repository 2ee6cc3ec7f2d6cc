//! Storage port - durable key/value persistence

use crate::domain::result::Result;

/// Durable string storage addressed by key
///
/// The transaction store keeps its whole record set under a single key as a
/// JSON document. Writes replace the previous value entirely and must be
/// durable by the time `write` returns.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, `None` if nothing was ever written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` entirely. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
