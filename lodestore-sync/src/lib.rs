//! Remote synchronization for Lodestore.
//!
//! Pulls a remote graph-structured dataset into local storage, one model at
//! a time, honoring the namespace's dependency ordering: a model's
//! `BELONGS_TO` parents complete before the model starts. The caller
//! supplies the network via [`RemoteTransport`] and consumes pages from the
//! channel returned by [`SyncProcessor::start`].

mod backoff;
mod error;
mod page;
mod processor;
pub mod transport;

pub use backoff::backoff_delay;
pub use error::{SyncError, SyncResult};
pub use page::SyncPage;
pub use processor::{ErrorHandler, SyncConfig, SyncProcessor};
pub use transport::{
    AuthMode, GraphQlRequest, GraphQlResponse, RemoteTransport, TransportError,
};
