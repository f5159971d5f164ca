//! Remote-filter translation.
//!
//! Converts a predicate tree into the GraphQL filter document the remote
//! store understands: `{"and": [...]}` / `{"or": [...]}` / `{"not": {...}}`
//! for groups and `{"field": {"operator": operand}}` for leaves, with
//! `between` carrying a two-element array.

use crate::predicate::{
    GroupKind, ModelPredicate, Operand, Operator, PredicateGroup, PredicateLeaf, PredicateNode,
};
use serde_json::{json, Value};

/// Translates a predicate into a remote filter document.
///
/// The match-all predicate translates to no filter at all.
#[must_use]
pub fn to_remote_filter(predicate: &ModelPredicate) -> Option<Value> {
    match predicate {
        ModelPredicate::All => None,
        ModelPredicate::Group(group) => Some(group_to_value(group)),
    }
}

fn group_to_value(group: &PredicateGroup) -> Value {
    match group.kind {
        GroupKind::And | GroupKind::Or => {
            let children: Vec<Value> = group.predicates.iter().map(node_to_value).collect();
            let key = if group.kind == GroupKind::And { "and" } else { "or" };
            json!({ key: children })
        }
        GroupKind::Not => {
            let child = group
                .predicates
                .first()
                .map(node_to_value)
                .unwrap_or_else(|| json!({}));
            json!({ "not": child })
        }
    }
}

fn node_to_value(node: &PredicateNode) -> Value {
    match node {
        PredicateNode::Group(group) => group_to_value(group),
        PredicateNode::Leaf(leaf) => leaf_to_value(leaf),
    }
}

fn leaf_to_value(leaf: &PredicateLeaf) -> Value {
    let operand = match &leaf.operand {
        Operand::Scalar(value) => value.clone(),
        Operand::Range(lo, hi) => json!([lo, hi]),
    };
    json!({ leaf.field.clone(): { operator_name(leaf.operator): operand } })
}

fn operator_name(operator: Operator) -> &'static str {
    match operator {
        Operator::Eq => "eq",
        Operator::Ne => "ne",
        Operator::Lt => "lt",
        Operator::Le => "le",
        Operator::Gt => "gt",
        Operator::Ge => "ge",
        Operator::BeginsWith => "beginsWith",
        Operator::Contains => "contains",
        Operator::NotContains => "notContains",
        Operator::Between => "between",
    }
}
