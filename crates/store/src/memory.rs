//! In-memory alias store.

use crate::error::{StoreError, StoreResult};
use crate::store::AliasStore;
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use shortlink_core::{Alias, AliasRecord};

/// Process-local alias store backed by a sharded concurrent map.
///
/// Each operation holds the shard lock for its key, so inserts, lookups and
/// deletes of one alias are serialized while distinct aliases proceed in parallel.
#[derive(Default)]
pub struct MemoryStore {
    aliases: DashMap<Alias, AliasRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[async_trait]
impl AliasStore for MemoryStore {
    async fn insert(&self, record: &AliasRecord) -> StoreResult<()> {
        match self.aliases.entry(record.alias.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(record.alias.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn resolve(&self, alias: &Alias) -> StoreResult<AliasRecord> {
        self.aliases
            .get(alias)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(alias.to_string()))
    }

    async fn delete(&self, alias: &Alias) -> StoreResult<()> {
        self.aliases
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(alias.to_string()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
