//! Local storage adapter for Lodestore.
//!
//! Persists records per model store keyed by (possibly composite) primary
//! key, hydrates single-row relations, cascades deletes through child
//! relationships, and selects the cheapest query strategy for each call.
//!
//! # Architecture
//!
//! - Records are flat JSON objects; identity is the primary-key values
//!   joined with the composite separator
//! - Concrete engines implement [`StorageEngine`]; [`MemoryEngine`] is the
//!   bundled default
//! - Relationship traversal (subgraph save, hydration, cascade delete)
//!   follows the schema's resolved join fields

mod adapter;
mod engine;
mod error;
mod memory;
mod query;

pub use adapter::{StorageAdapter, WriteKind};
pub use engine::StorageEngine;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryEngine;
pub use query::{plan_query, sort_records, Pagination, QueryOne, QueryPlan, SortDirection, SortSpec};
