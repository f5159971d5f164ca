//! Explicit predicate builder.
//!
//! Constructed from a model's static field list; every leaf is validated
//! against the declared fields and their type families as it is appended.
//! Nesting goes through `and`/`or`/`not` closures, each of which receives a
//! fresh builder for the nested group and returns it with leaves appended.

use crate::predicate::{
    GroupKind, ModelPredicate, Operand, Operator, PredicateGroup, PredicateLeaf, PredicateNode,
};
use crate::{PredicateError, PredicateResult};
use lodestore_schema::{SchemaModel, TypeFamily};
use serde_json::Value;

/// Builds a [`ModelPredicate`] for one model.
#[derive(Debug)]
pub struct PredicateBuilder<'a> {
    model: &'a SchemaModel,
    group: PredicateGroup,
}

impl<'a> PredicateBuilder<'a> {
    /// Starts a builder whose root group is a conjunction.
    #[must_use]
    pub fn new(model: &'a SchemaModel) -> Self {
        Self::with_kind(model, GroupKind::And)
    }

    fn with_kind(model: &'a SchemaModel, kind: GroupKind) -> Self {
        Self {
            model,
            group: PredicateGroup::new(kind),
        }
    }

    /// Appends a single-operand leaf for `field`.
    pub fn field(
        mut self,
        field: &str,
        operator: Operator,
        operand: impl Into<Value>,
    ) -> PredicateResult<Self> {
        self.check(field, operator)?;
        self.group.predicates.push(PredicateNode::Leaf(PredicateLeaf {
            field: field.to_string(),
            operator,
            operand: Operand::Scalar(operand.into()),
        }));
        Ok(self)
    }

    /// Appends an inclusive-range `between` leaf for `field`.
    pub fn between(
        mut self,
        field: &str,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> PredicateResult<Self> {
        self.check(field, Operator::Between)?;
        self.group.predicates.push(PredicateNode::Leaf(PredicateLeaf {
            field: field.to_string(),
            operator: Operator::Between,
            operand: Operand::Range(lo.into(), hi.into()),
        }));
        Ok(self)
    }

    /// Nests a conjunction group.
    pub fn and<F>(self, f: F) -> PredicateResult<Self>
    where
        F: FnOnce(PredicateBuilder<'a>) -> PredicateResult<PredicateBuilder<'a>>,
    {
        self.nest(GroupKind::And, f)
    }

    /// Nests a disjunction group.
    pub fn or<F>(self, f: F) -> PredicateResult<Self>
    where
        F: FnOnce(PredicateBuilder<'a>) -> PredicateResult<PredicateBuilder<'a>>,
    {
        self.nest(GroupKind::Or, f)
    }

    /// Nests a negation: the callback builds the single child group.
    pub fn not<F>(self, f: F) -> PredicateResult<Self>
    where
        F: FnOnce(PredicateBuilder<'a>) -> PredicateResult<PredicateBuilder<'a>>,
    {
        let child = f(PredicateBuilder::with_kind(self.model, GroupKind::And))?;
        let mut group = PredicateGroup::new(GroupKind::Not);
        group.predicates.push(PredicateNode::Group(child.group));
        let mut this = self;
        this.group.predicates.push(PredicateNode::Group(group));
        Ok(this)
    }

    fn nest<F>(mut self, kind: GroupKind, f: F) -> PredicateResult<Self>
    where
        F: FnOnce(PredicateBuilder<'a>) -> PredicateResult<PredicateBuilder<'a>>,
    {
        let child = f(PredicateBuilder::with_kind(self.model, kind))?;
        self.group.predicates.push(PredicateNode::Group(child.group));
        Ok(self)
    }

    /// Finishes the build, returning the predicate tree.
    #[must_use]
    pub fn build(self) -> ModelPredicate {
        ModelPredicate::Group(self.group)
    }

    fn check(&self, field: &str, operator: Operator) -> PredicateResult<()> {
        let def = self.model.field(field).ok_or_else(|| PredicateError::UnknownField {
            model: self.model.name.clone(),
            field: field.to_string(),
        })?;

        let legal = if def.is_array {
            matches!(
                operator,
                Operator::Eq | Operator::Ne | Operator::Contains | Operator::NotContains
            )
        } else {
            match def.kind.family() {
                TypeFamily::Boolean => matches!(operator, Operator::Eq | Operator::Ne),
                TypeFamily::Numeric => matches!(
                    operator,
                    Operator::Eq
                        | Operator::Ne
                        | Operator::Lt
                        | Operator::Le
                        | Operator::Gt
                        | Operator::Ge
                        | Operator::Between
                ),
                // Every operator has string semantics: lexicographic ordering,
                // substring tests, inclusive string ranges.
                TypeFamily::String => true,
                TypeFamily::Json => matches!(operator, Operator::Eq | Operator::Ne),
            }
        };

        if legal {
            Ok(())
        } else {
            Err(PredicateError::OperatorNotSupported {
                model: self.model.name.clone(),
                field: field.to_string(),
                operator,
            })
        }
    }
}
