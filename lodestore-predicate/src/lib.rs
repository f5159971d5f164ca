//! Predicate expression engine for Lodestore.
//!
//! Builds and evaluates boolean filter trees over one model type. Pure, no
//! I/O. The same tree feeds local filtering (the storage adapter's scan
//! path) and remote-filter translation (the sync processor's GraphQL filter
//! documents).
//!
//! Predicates are built through an explicit [`PredicateBuilder`] validated
//! against the model's static field list; accessing an undeclared field or
//! applying an operator outside the field's type family is a validation
//! error, raised synchronously and never retried.

mod builder;
mod predicate;
mod remote;

pub use builder::PredicateBuilder;
pub use predicate::{
    GroupKind, ModelPredicate, Operand, Operator, PredicateGroup, PredicateLeaf, PredicateNode,
};
pub use remote::to_remote_filter;

/// Result type alias using the crate's error type.
pub type PredicateResult<T> = std::result::Result<T, PredicateError>;

/// Validation errors raised while building a predicate.
#[derive(Debug, thiserror::Error)]
pub enum PredicateError {
    #[error("unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },

    #[error("operator {operator:?} is not valid for field '{field}' on model '{model}'")]
    OperatorNotSupported {
        model: String,
        field: String,
        operator: Operator,
    },
}
