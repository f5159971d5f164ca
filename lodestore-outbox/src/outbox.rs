//! The outbox queue.

use crate::event::MutationEvent;
use lodestore_types::{MutationId, OpType, Record};
use std::collections::{HashSet, VecDeque};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct OutboxState {
    queue: VecDeque<MutationEvent>,
    /// The claimed head, while the dispatcher is sending it.
    in_progress: Option<MutationId>,
}

/// An ordered queue of pending local writes with conflict-aware coalescing
/// and single-in-flight dequeue semantics.
#[derive(Debug, Default)]
pub struct MutationOutbox {
    state: Mutex<OutboxState>,
}

impl MutationOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a mutation, coalescing against any resident non-claimed
    /// event for the same record:
    ///
    /// - resident `CREATE` + incoming `DELETE` cancel out entirely;
    /// - resident `CREATE` + incoming `CREATE`/`UPDATE` replace the payload
    ///   but stay a `CREATE` and drop any condition (an unsent create
    ///   cannot be conditioned);
    /// - resident `UPDATE`/`DELETE` is superseded by an unconditioned
    ///   incoming event, while a conditioned incoming event queues behind
    ///   it (each condition must be evaluated server-side independently).
    pub async fn enqueue(&self, event: MutationEvent) {
        let mut state = self.state.lock().await;

        let resident = state
            .queue
            .iter()
            .rposition(|e| e.model_id == event.model_id && state.in_progress != Some(e.id));

        let Some(idx) = resident else {
            debug!(model = %event.model_name, id = %event.model_id, "outbox append");
            state.queue.push_back(event);
            return;
        };

        match state.queue[idx].operation {
            OpType::Create => match event.operation {
                OpType::Delete => {
                    // Unsent create followed by delete is a net no-op.
                    debug!(id = %event.model_id, "outbox cancel unsent create");
                    state.queue.remove(idx);
                }
                OpType::Create | OpType::Update => {
                    let existing = &mut state.queue[idx];
                    existing.data = event.data;
                    existing.version = event.version;
                    existing.operation = OpType::Create;
                    existing.condition = None;
                    debug!(id = %existing.model_id, "outbox merge into unsent create");
                }
            },
            OpType::Update | OpType::Delete => {
                if event.condition.is_none() {
                    debug!(id = %event.model_id, "outbox supersede pending mutation");
                    state.queue.remove(idx);
                }
                state.queue.push_back(event);
            }
        }
    }

    /// Returns the head event and claims it as in-progress. Repeated peeks
    /// return the same claimed event.
    pub async fn peek(&self) -> Option<MutationEvent> {
        let mut state = self.state.lock().await;
        let head = state.queue.front().cloned()?;
        state.in_progress = Some(head.id);
        Some(head)
    }

    /// Removes the claimed head, releasing the in-progress slot.
    ///
    /// When the server's acknowledged `record` is supplied, its version
    /// stamps are propagated best-effort onto still-queued events for the
    /// same record so resends do not carry stale tokens.
    pub async fn dequeue(&self, record: Option<&Record>) -> Option<MutationEvent> {
        let mut state = self.state.lock().await;
        let head = state.queue.pop_front()?;
        state.in_progress = None;

        if let Some(record) = record {
            if let Some(version) = record.version() {
                let last_changed_at = record.last_changed_at();
                for queued in state
                    .queue
                    .iter_mut()
                    .filter(|e| e.model_id == head.model_id)
                {
                    if queued.data.version().map(|v| v < version).unwrap_or(true) {
                        queued.data = queued.data.with_version(version);
                        if let Some(lca) = last_changed_at {
                            queued.data = queued.data.with_last_changed_at(lca);
                        }
                        queued.version = Some(version);
                    }
                }
            }
        }

        debug!(model = %head.model_name, id = %head.model_id, "outbox dequeue");
        Some(head)
    }

    /// All queued events for one record, in queue order.
    pub async fn get_for_model(&self, model_id: &str) -> Vec<MutationEvent> {
        self.state
            .lock()
            .await
            .queue
            .iter()
            .filter(|e| e.model_id == model_id)
            .cloned()
            .collect()
    }

    /// The distinct record ids with pending mutations.
    pub async fn model_ids(&self) -> HashSet<String> {
        self.state
            .lock()
            .await
            .queue
            .iter()
            .map(|e| e.model_id.clone())
            .collect()
    }

    /// Number of pending events.
    pub async fn len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
