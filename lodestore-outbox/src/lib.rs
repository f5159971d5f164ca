//! Pending-mutation outbox for Lodestore.
//!
//! Serializes local writes into a single ordered stream awaiting
//! transmission to the remote store. Enqueueing coalesces against resident
//! mutations for the same record so at most one unconditional mutation is
//! ever pending per record; an external network dispatcher drains the queue
//! one claimed event at a time.
//!
//! Each outbox is an explicit instance owning its own state, constructed
//! once per local database; all queue access runs inside its mutex so
//! enqueue and dequeue never interleave.

mod event;
mod outbox;

pub use event::MutationEvent;
pub use outbox::MutationOutbox;
