//! Common test utilities for alias store tests.

use shortlink_core::{Alias, AliasRecord, TargetUrl};
use shortlink_store::{AliasStore, MemoryStore, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A SQLite alias store in a temporary directory that is removed on drop.
#[allow(dead_code)]
pub struct TestSqlite {
    pub store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

impl TestSqlite {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = SqliteStore::new(temp_dir.path().join("test.db"), Duration::from_secs(5))
            .await
            .expect("Failed to open SQLite store");
        Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        }
    }

    pub fn store(&self) -> Arc<dyn AliasStore> {
        self.store.clone()
    }
}

/// Run a test against both the SQLite and the in-memory backends.
#[allow(dead_code)]
pub async fn run_store_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Arc<dyn AliasStore>) -> Fut + Clone,
    Fut: std::future::Future<Output = ()>,
{
    let sqlite = TestSqlite::new().await;
    test_fn.clone()(sqlite.store()).await;

    let memory: Arc<dyn AliasStore> = Arc::new(MemoryStore::new());
    test_fn(memory).await;
}

#[allow(dead_code)]
pub fn alias(s: &str) -> Alias {
    Alias::parse(s).expect("valid test alias")
}

#[allow(dead_code)]
pub fn target(s: &str) -> TargetUrl {
    TargetUrl::parse(s).expect("valid test url")
}

#[allow(dead_code)]
pub fn record(a: &str, t: &str) -> AliasRecord {
    AliasRecord::new(alias(a), target(t))
}
