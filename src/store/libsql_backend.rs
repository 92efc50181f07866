//! libSQL backend — `KeyValueStore` over a local `settings` table.
//!
//! Every value lives under `(scope, key)`; one store instance is bound to one
//! scope, which is the client installation (or the signed-in user).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::error::DatabaseError;
use crate::store::DEFAULT_SCOPE;
use crate::store::migrations;
use crate::store::traits::KeyValueStore;

/// libSQL settings store.
///
/// Holds a single connection that is reused for all operations.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    scope: String,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Pool(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            scope: DEFAULT_SCOPE.to_string(),
        })
    }

    /// Bind the store to another scope (e.g. a user id). Shares the connection.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

#[async_trait]
impl KeyValueStore for LibSqlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE scope = ?1 AND key = ?2",
                params![self.scope.as_str(), key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO settings (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (scope, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.scope.as_str(), key, value, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set: {e}")))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute(
                "DELETE FROM settings WHERE scope = ?1 AND key = ?2",
                params![self.scope.as_str(), key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete: {e}")))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlStore {
        LibSqlStore::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn settings_crud() {
        let db = test_db().await;

        db.set("subscription_tier", "weekly").await.unwrap();
        assert_eq!(
            db.get("subscription_tier").await.unwrap().as_deref(),
            Some("weekly")
        );

        // Upsert
        db.set("subscription_tier", "free").await.unwrap();
        assert_eq!(
            db.get("subscription_tier").await.unwrap().as_deref(),
            Some("free")
        );

        assert!(db.delete("subscription_tier").await.unwrap());
        assert!(db.get("subscription_tier").await.unwrap().is_none());
        assert!(!db.delete("subscription_tier").await.unwrap());
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let db = test_db().await;
        assert!(db.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoped.db");

        let alice = LibSqlStore::new_local(&path).await.unwrap().with_scope("alice");
        let bob = LibSqlStore::new_local(&path).await.unwrap().with_scope("bob");

        alice.set("theme", "dark").await.unwrap();
        bob.set("theme", "colorful").await.unwrap();

        assert_eq!(alice.get("theme").await.unwrap().as_deref(), Some("dark"));
        assert_eq!(bob.get("theme").await.unwrap().as_deref(), Some("colorful"));
        assert_eq!(alice.scope(), "alice");
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/lovespark.db");

        {
            let db = LibSqlStore::new_local(&path).await.unwrap();
            db.set("remaining_swipes", "4").await.unwrap();
        }

        let reopened = LibSqlStore::new_local(&path).await.unwrap();
        assert_eq!(
            reopened.get("remaining_swipes").await.unwrap().as_deref(),
            Some("4")
        );
    }
}
