//! The storage-engine adapter contract.
//!
//! Concrete engines (browser key-value store, mobile SQL engine, in-memory
//! maps) live behind this trait. Each model has its own store, keyed by the
//! record's (possibly composite) primary key.

use crate::StorageResult;
use async_trait::async_trait;
use lodestore_types::{Record, RecordKey};

/// A key-value engine persisting records per model store.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Gets one record by key.
    async fn get(&self, store: &str, key: &RecordKey) -> StorageResult<Option<Record>>;

    /// Writes one record under its key, replacing any existing row.
    async fn put(&self, store: &str, key: RecordKey, record: Record) -> StorageResult<()>;

    /// Removes one record by key. Removing an absent key is a no-op.
    async fn delete(&self, store: &str, key: &RecordKey) -> StorageResult<()>;

    /// Returns every record in a store, in key order.
    async fn scan(&self, store: &str) -> StorageResult<Vec<Record>>;

    /// Native pagination over a store's key order, when the engine supports
    /// it. Returns `None` when unsupported; the adapter then emulates the
    /// window by slicing a full scan.
    async fn scan_window(
        &self,
        _store: &str,
        _start: usize,
        _end: usize,
    ) -> StorageResult<Option<Vec<Record>>> {
        Ok(None)
    }

    /// Removes every record from every store.
    async fn clear(&self) -> StorageResult<()>;
}
