//! Schema metadata for Lodestore.
//!
//! The schema is immutable external input, loaded once at startup from
//! codegen output. It describes each model's fields (scalar kind, required,
//! array, read-only), its primary key (defaulting to `["id"]`, possibly
//! composite), and its relationship associations.
//!
//! The relationship resolver derives the join fields for
//! `HAS_ONE`/`HAS_MANY`/`BELONGS_TO` fields. Codegen only states one side of
//! a relationship explicitly, so the other side falls back to primary-key
//! fields; both join lookup and cascade-delete traversal rely on that
//! inference being consistent.

mod relationship;
mod schema;

pub use relationship::{Relationship, RelationKind};
pub use schema::{
    ModelAssociation, ModelField, Namespace, ScalarKind, Schema, SchemaModel, TypeFamily,
};

/// Result type alias using the crate's error type.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Configuration errors surfaced when a schema is validated.
///
/// These are raised once, at adapter initialization, never per record.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },

    #[error("association on '{model}.{field}' targets unknown model '{target}'")]
    UnknownTargetModel {
        model: String,
        field: String,
        target: String,
    },

    #[error("association on '{model}.{field}' names missing join field '{join_field}'")]
    MissingJoinField {
        model: String,
        field: String,
        join_field: String,
    },

    #[error("topological ordering is missing syncable model '{0}'")]
    OrderingMissingModel(String),
}
