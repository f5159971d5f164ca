//! Error types for the sync layer.

use crate::transport::TransportError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while syncing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Terminal transport failure; aborts the affected model's loop.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Every configured auth mode was rejected for a model.
    ///
    /// Non-fatal: the model degrades to an empty page so one unauthorized
    /// model does not block the others.
    #[error("authorization exhausted for model '{model}'")]
    AuthExhausted { model: String },

    /// The remote response carried no usable page data.
    #[error("remote error for model '{model}': {message}")]
    Remote { model: String, message: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The processor was stopped.
    #[error("sync cancelled")]
    Cancelled,
}
