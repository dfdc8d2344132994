//! Alias store trait and SQLite implementation.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use shortlink_core::{Alias, AliasRecord, TargetUrl};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{FromRow, Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// Durable alias → target mapping.
///
/// Implementations serialize conflicting operations on the same alias
/// internally: callers never lock around them.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// Insert a record if its alias is absent.
    ///
    /// Fails with `AlreadyExists` when the alias is taken. Of several concurrent
    /// inserts of the same alias exactly one succeeds.
    async fn insert(&self, record: &AliasRecord) -> StoreResult<()>;

    /// Look up a record. Fails with `NotFound` when absent.
    async fn resolve(&self, alias: &Alias) -> StoreResult<AliasRecord>;

    /// Remove a record. Fails with `NotFound` when absent.
    async fn delete(&self, alias: &Alias) -> StoreResult<()>;

    /// Check backend connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;
}

/// Row shape of the `aliases` table.
#[derive(Debug, Clone, FromRow)]
struct AliasRow {
    alias: String,
    target: String,
    created_at: OffsetDateTime,
}

impl TryFrom<AliasRow> for AliasRecord {
    type Error = StoreError;

    fn try_from(row: AliasRow) -> StoreResult<Self> {
        let alias = Alias::parse(&row.alias)
            .map_err(|e| StoreError::Internal(format!("corrupt alias row: {e}")))?;
        let target = TargetUrl::parse(&row.target)
            .map_err(|e| StoreError::Internal(format!("corrupt alias row {alias}: {e}")))?;
        Ok(AliasRecord {
            alias,
            target,
            created_at: row.created_at,
        })
    }
}

/// SQLite-based alias store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if missing) a SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>, busy_timeout: Duration) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            // A single connection keeps writers from tripping over "database is locked"
            // and keeps `:memory:` databases alive for the lifetime of the pool.
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "SQLite alias store opened");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AliasStore for SqliteStore {
    async fn insert(&self, record: &AliasRecord) -> StoreResult<()> {
        match sqlx::query("INSERT INTO aliases (alias, target, created_at) VALUES (?, ?, ?)")
            .bind(record.alias.as_str())
            .bind(record.target.as_str())
            .bind(record.created_at)
            .execute(&self.pool)
            .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::AlreadyExists(record.alias.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve(&self, alias: &Alias) -> StoreResult<AliasRecord> {
        let row = sqlx::query_as::<_, AliasRow>(
            "SELECT alias, target, created_at FROM aliases WHERE alias = ?",
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| StoreError::NotFound(alias.to_string()))?
            .try_into()
    }

    async fn delete(&self, alias: &Alias) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM aliases WHERE alias = ?")
            .bind(alias.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(alias.to_string()));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS aliases (
    alias TEXT PRIMARY KEY NOT NULL,
    target TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    async fn open() -> (tempfile::TempDir, SqliteStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db"), Duration::from_secs(1))
            .await
            .unwrap();
        (temp, store)
    }

    fn record(alias: &str, target: &str) -> AliasRecord {
        AliasRecord::new(Alias::parse(alias).unwrap(), TargetUrl::parse(target).unwrap())
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let (_temp, store) = open().await;
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_already_exists() {
        let (_temp, store) = open().await;
        store.insert(&record("go", "https://a.example")).await.unwrap();

        let err = store
            .insert(&record("go", "https://b.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(ref a) if a == "go"));

        let kept = store.resolve(&Alias::parse("go").unwrap()).await.unwrap();
        assert_eq!(kept.target.as_str(), "https://a.example/");
    }

    #[tokio::test]
    async fn test_corrupt_row_is_internal_error() {
        let (_temp, store) = open().await;
        sqlx::query("INSERT INTO aliases (alias, target, created_at) VALUES (?, ?, ?)")
            .bind("bad")
            .bind("not a url")
            .bind(OffsetDateTime::now_utc())
            .execute(store.pool())
            .await
            .unwrap();

        let err = store
            .resolve(&Alias::parse("bad").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("durable.db");
        {
            let store = SqliteStore::new(&path, Duration::from_secs(1)).await.unwrap();
            store.insert(&record("keep", "https://example.com/keep")).await.unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::new(&path, Duration::from_secs(1)).await.unwrap();
        let found = store.resolve(&Alias::parse("keep").unwrap()).await.unwrap();
        assert_eq!(found.target.as_str(), "https://example.com/keep");
    }
}
