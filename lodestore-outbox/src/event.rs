//! Mutation events.
//!
//! A mutation event is one pending local write: the operation, the record
//! payload, and an optional condition the server must evaluate before
//! applying it. Events are immutable once built; coalescing replaces them
//! wholesale.

use lodestore_predicate::ModelPredicate;
use lodestore_types::{MutationId, OpType, Record};
use serde::{Deserialize, Serialize};

/// A pending local write awaiting transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEvent {
    /// Unique identifier for this event.
    pub id: MutationId,

    /// The affected record's identity (primary-key value).
    pub model_id: String,

    /// The affected model.
    pub model_name: String,

    /// The operation to transmit.
    pub operation: OpType,

    /// The record payload.
    pub data: Record,

    /// Condition the server evaluates before applying the mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ModelPredicate>,

    /// Version token expected by the server, when known.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_version")]
    pub version: Option<i64>,
}

impl MutationEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(
        model_name: impl Into<String>,
        model_id: impl Into<String>,
        operation: OpType,
        data: Record,
    ) -> Self {
        Self {
            id: MutationId::new(),
            model_id: model_id.into(),
            model_name: model_name.into(),
            operation,
            data,
            condition: None,
            version: None,
        }
    }

    /// Creates a CREATE event.
    #[must_use]
    pub fn create(
        model_name: impl Into<String>,
        model_id: impl Into<String>,
        data: Record,
    ) -> Self {
        Self::new(model_name, model_id, OpType::Create, data)
    }

    /// Creates an UPDATE event.
    #[must_use]
    pub fn update(
        model_name: impl Into<String>,
        model_id: impl Into<String>,
        data: Record,
    ) -> Self {
        Self::new(model_name, model_id, OpType::Update, data)
    }

    /// Creates a DELETE event.
    #[must_use]
    pub fn delete(
        model_name: impl Into<String>,
        model_id: impl Into<String>,
        data: Record,
    ) -> Self {
        Self::new(model_name, model_id, OpType::Delete, data)
    }

    /// Attaches a server-side condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ModelPredicate) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Stamps the expected version token.
    #[must_use]
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }
}
