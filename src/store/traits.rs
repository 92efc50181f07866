//! `KeyValueStore` trait — the single async interface for local persistence.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// String key-value storage scoped to one client installation.
///
/// Writes are independent: there is no transaction spanning several keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Remove a value. Returns whether anything was deleted.
    async fn delete(&self, key: &str) -> Result<bool, DatabaseError>;
}
