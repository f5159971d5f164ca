//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying engine error.
    #[error("engine error: {0}")]
    Engine(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema configuration error, surfaced at adapter initialization.
    #[error("schema error: {0}")]
    Schema(#[from] lodestore_schema::SchemaError),

    /// Record shape error (missing key field, non-object payload).
    #[error("record error: {0}")]
    Record(#[from] lodestore_types::Error),

    /// A conditional write did not match the stored record.
    ///
    /// Fatal to the single operation; state is unchanged and the failure
    /// is never retried.
    #[error("conditional write failed for '{model}' key '{key}'")]
    ConditionFailed { model: String, key: String },

    /// Unknown model name.
    #[error("unknown model: {0}")]
    UnknownModel(String),
}
