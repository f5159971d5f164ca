//! In-memory storage engine.
//!
//! Per-store `BTreeMap`s keyed by record key, so scans come back in key
//! order. Used as the default engine and by tests; production deployments
//! substitute a platform engine behind the same trait.

use crate::engine::StorageEngine;
use crate::StorageResult;
use async_trait::async_trait;
use lodestore_types::{Record, RecordKey};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// A purely in-memory [`StorageEngine`].
#[derive(Debug, Default)]
pub struct MemoryEngine {
    stores: RwLock<BTreeMap<String, BTreeMap<RecordKey, Record>>>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in one store.
    pub async fn len(&self, store: &str) -> usize {
        self.stores
            .read()
            .await
            .get(store)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Whether a store holds no records.
    pub async fn is_empty(&self, store: &str) -> bool {
        self.len(store).await == 0
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn get(&self, store: &str, key: &RecordKey) -> StorageResult<Option<Record>> {
        Ok(self
            .stores
            .read()
            .await
            .get(store)
            .and_then(|s| s.get(key))
            .cloned())
    }

    async fn put(&self, store: &str, key: RecordKey, record: Record) -> StorageResult<()> {
        self.stores
            .write()
            .await
            .entry(store.to_string())
            .or_default()
            .insert(key, record);
        Ok(())
    }

    async fn delete(&self, store: &str, key: &RecordKey) -> StorageResult<()> {
        if let Some(s) = self.stores.write().await.get_mut(store) {
            s.remove(key);
        }
        Ok(())
    }

    async fn scan(&self, store: &str) -> StorageResult<Vec<Record>> {
        Ok(self
            .stores
            .read()
            .await
            .get(store)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn scan_window(
        &self,
        store: &str,
        start: usize,
        end: usize,
    ) -> StorageResult<Option<Vec<Record>>> {
        let stores = self.stores.read().await;
        let Some(s) = stores.get(store) else {
            return Ok(Some(Vec::new()));
        };
        Ok(Some(
            s.values().skip(start).take(end.saturating_sub(start)).cloned().collect(),
        ))
    }

    async fn clear(&self) -> StorageResult<()> {
        self.stores.write().await.clear();
        Ok(())
    }
}
