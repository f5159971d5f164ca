//! Core type definitions for Lodestore.
//!
//! This crate defines the fundamental, model-agnostic types used throughout
//! the local cache:
//! - Mutation identifiers (UUID v7)
//! - Record keys (possibly composite primary keys)
//! - The generic JSON-backed record representation with sync system fields
//!
//! All model-specific structure lives in schema metadata, not here.

mod ids;
mod record;

pub use ids::{MutationId, RecordKey, PRIMARY_KEY_SEPARATOR};
pub use record::{
    now_millis, OpType, Record, DELETED_FIELD, LAST_CHANGED_AT_FIELD, VERSION_FIELD,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record is missing key field '{0}'")]
    MissingKeyField(String),
}
