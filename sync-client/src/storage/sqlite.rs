//! SQLite key-value store.

use super::{KeyValueStore, StoreError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// SQLite-backed key-value store.
///
/// All namespaces share one `kv` table keyed by `(namespace, key)`.
/// Uses WAL mode for concurrent reads/writes.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteStore {
    /// Open a database file, creating it if it doesn't exist.
    pub async fn new(path: &Path, namespace: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, namespace).await
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory(namespace: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(":memory:")?;

        // One connection: each `:memory:` connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, namespace).await
    }

    /// Same database, different namespace.
    pub fn namespaced(&self, namespace: &str) -> Self {
        Self {
            pool: self.pool.clone(),
            namespace: namespace.to_string(),
        }
    }

    async fn with_pool(pool: SqlitePool, namespace: &str) -> Result<Self, StoreError> {
        let store = Self {
            pool,
            namespace: namespace.to_string(),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (namespace, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv WHERE namespace = ?1 AND key = ?2")
                .bind(&self.namespace)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv (namespace, key, value)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%s', 'now')
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE namespace = ?1 AND key = ?2")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_set_get() {
        let store = SqliteStore::in_memory("cleanout").await.unwrap();
        store.set("sync_queue", "[]").await.unwrap();
        assert_eq!(store.get("sync_queue").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn sqlite_upsert_replaces() {
        let store = SqliteStore::in_memory("cleanout").await.unwrap();
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn sqlite_remove() {
        let store = SqliteStore::in_memory("cleanout").await.unwrap();
        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_namespaces_are_isolated() {
        let a = SqliteStore::in_memory("a").await.unwrap();
        let b = a.namespaced("b");

        a.set("k", "from-a").await.unwrap();

        assert_eq!(b.get("k").await.unwrap(), None);
        assert_eq!(a.get("k").await.unwrap().as_deref(), Some("from-a"));
    }

    #[tokio::test]
    async fn sqlite_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");

        {
            let store = SqliteStore::new(&path, "cleanout").await.unwrap();
            store.set("auth_token", "tok").await.unwrap();
            store.pool.close().await;
        }

        let store = SqliteStore::new(&path, "cleanout").await.unwrap();
        assert_eq!(
            store.get("auth_token").await.unwrap().as_deref(),
            Some("tok")
        );
    }
}
