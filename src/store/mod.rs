//! Persistence layer: key-value settings store with libSQL and in-memory backends.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

/// Scope used when the client install has a single local user.
pub const DEFAULT_SCOPE: &str = "default";
