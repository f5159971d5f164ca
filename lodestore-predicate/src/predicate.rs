//! Predicate tree types and evaluation.

use lodestore_types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators available to predicate leaves.
///
/// Which operators are legal for a field depends on the field's type
/// family; the builder enforces that at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BeginsWith,
    Contains,
    NotContains,
    Between,
}

/// A leaf operand: a single scalar, or an inclusive range for `between`.
///
/// On the wire a range is a plain two-element array, indistinguishable from
/// a scalar array value; deserialization therefore happens on the leaf,
/// where the operator disambiguates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Scalar(Value),
    Range(Value, Value),
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateLeaf {
    pub field: String,
    pub operator: Operator,
    pub operand: Operand,
}

impl<'de> Deserialize<'de> for PredicateLeaf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawLeaf {
            field: String,
            operator: Operator,
            operand: Value,
        }

        let raw = RawLeaf::deserialize(deserializer)?;
        let operand = if raw.operator == Operator::Between {
            let Value::Array(bounds) = raw.operand else {
                return Err(serde::de::Error::custom(
                    "between operand must be a two-element array",
                ));
            };
            match <[Value; 2]>::try_from(bounds) {
                Ok([lo, hi]) => Operand::Range(lo, hi),
                Err(bounds) => {
                    return Err(serde::de::Error::custom(format!(
                        "between takes exactly two bounds, got {}",
                        bounds.len()
                    )));
                }
            }
        } else {
            Operand::Scalar(raw.operand)
        };

        Ok(Self {
            field: raw.field,
            operator: raw.operator,
            operand,
        })
    }
}

/// Boolean connective of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    And,
    Or,
    Not,
}

/// A node in the predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateNode {
    Leaf(PredicateLeaf),
    Group(PredicateGroup),
}

/// A boolean group over leaves and nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateGroup {
    #[serde(rename = "type")]
    pub kind: GroupKind,
    pub predicates: Vec<PredicateNode>,
}

impl PredicateGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            predicates: Vec::new(),
        }
    }

    /// Evaluates the group against a record.
    ///
    /// `and` passes when all children pass (vacuously true when empty),
    /// `or` when any child passes, `not` negates its single child group.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self.kind {
            GroupKind::And => self.predicates.iter().all(|p| p.matches(record)),
            GroupKind::Or => self.predicates.iter().any(|p| p.matches(record)),
            GroupKind::Not => !self
                .predicates
                .first()
                .map(|p| p.matches(record))
                .unwrap_or(false),
        }
    }

    /// The leaves of this group when it is a flat conjunction: returns
    /// `None` if the group nests sub-groups or is not `and`.
    #[must_use]
    pub fn as_flat_conjunction(&self) -> Option<Vec<&PredicateLeaf>> {
        if self.kind != GroupKind::And {
            return None;
        }
        let mut leaves = Vec::with_capacity(self.predicates.len());
        for node in &self.predicates {
            match node {
                PredicateNode::Leaf(leaf) => leaves.push(leaf),
                PredicateNode::Group(_) => return None,
            }
        }
        Some(leaves)
    }
}

impl PredicateNode {
    /// Evaluates the node against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            PredicateNode::Leaf(leaf) => leaf.matches(record),
            PredicateNode::Group(group) => group.matches(record),
        }
    }
}

/// A complete predicate for one model: a tree, or the match-all singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelPredicate {
    /// Accepts every record.
    All,
    Group(PredicateGroup),
}

impl ModelPredicate {
    /// The match-all singleton.
    #[must_use]
    pub fn all() -> Self {
        ModelPredicate::All
    }

    /// Evaluates the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            ModelPredicate::All => true,
            ModelPredicate::Group(group) => group.matches(record),
        }
    }

    /// The underlying group, if any.
    #[must_use]
    pub fn as_group(&self) -> Option<&PredicateGroup> {
        match self {
            ModelPredicate::All => None,
            ModelPredicate::Group(group) => Some(group),
        }
    }
}

impl PredicateLeaf {
    /// Evaluates the leaf against a record.
    ///
    /// A missing or null field only satisfies `ne` and `notContains`.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.get(&self.field).filter(|v| !v.is_null());
        let Some(value) = value else {
            return matches!(self.operator, Operator::Ne | Operator::NotContains);
        };

        match (&self.operator, &self.operand) {
            (Operator::Eq, Operand::Scalar(operand)) => value == operand,
            (Operator::Ne, Operand::Scalar(operand)) => value != operand,
            (Operator::Lt, Operand::Scalar(operand)) => compare(value, operand, |o| o.is_lt()),
            (Operator::Le, Operand::Scalar(operand)) => compare(value, operand, |o| o.is_le()),
            (Operator::Gt, Operand::Scalar(operand)) => compare(value, operand, |o| o.is_gt()),
            (Operator::Ge, Operand::Scalar(operand)) => compare(value, operand, |o| o.is_ge()),
            (Operator::BeginsWith, Operand::Scalar(operand)) => {
                match (value.as_str(), operand.as_str()) {
                    (Some(v), Some(prefix)) => v.starts_with(prefix),
                    _ => false,
                }
            }
            (Operator::Contains, Operand::Scalar(operand)) => contains(value, operand),
            (Operator::NotContains, Operand::Scalar(operand)) => !contains(value, operand),
            (Operator::Between, Operand::Range(lo, hi)) => {
                compare(value, lo, |o| o.is_ge()) && compare(value, hi, |o| o.is_le())
            }
            // Operand arity mismatches cannot be produced by the builder.
            _ => false,
        }
    }
}

/// Ordering comparison over JSON scalars: numbers compare numerically,
/// strings lexicographically; anything else is not comparable.
fn compare(value: &Value, operand: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Some(a), Some(b)) = (value.as_f64(), operand.as_f64()) {
        return a.partial_cmp(&b).map(&accept).unwrap_or(false);
    }
    if let (Some(a), Some(b)) = (value.as_str(), operand.as_str()) {
        return accept(a.cmp(b));
    }
    false
}

/// `contains` is substring for strings and membership for arrays.
fn contains(value: &Value, operand: &Value) -> bool {
    match value {
        Value::String(s) => operand.as_str().map(|sub| s.contains(sub)).unwrap_or(false),
        Value::Array(items) => items.contains(operand),
        _ => false,
    }
}
