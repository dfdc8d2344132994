//! Alias store abstraction and implementations for shortlink.
//!
//! This crate owns the alias lifecycle:
//! - The `AliasStore` contract (insert-if-absent, resolve, delete)
//! - SQLite and in-memory backends
//! - Generated-alias allocation with bounded collision retries

pub mod error;
pub mod memory;
pub mod save;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use save::AliasSaver;
pub use store::{AliasStore, SqliteStore};

use shortlink_core::config::StoreConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create an alias store from configuration.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn AliasStore>> {
    match config {
        StoreConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteStore::new(path, Duration::from_secs(*busy_timeout_secs)).await?;
            Ok(Arc::new(store) as Arc<dyn AliasStore>)
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory alias store, aliases will not survive a restart");
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn AliasStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_sqlite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("shortlink.db");
        let config = StoreConfig::Sqlite {
            path: db_path.clone(),
            busy_timeout_secs: 1,
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_from_config_memory() {
        let store = from_config(&StoreConfig::Memory).await.unwrap();
        store.health_check().await.unwrap();
    }
}
