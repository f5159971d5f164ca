//! Relationship resolution.
//!
//! Derives the join fields of a relationship field from schema metadata.
//! Codegen states one side explicitly; the resolution rules for the other
//! side are:
//!
//! - local join fields: explicit `targetNames` if declared, else the local
//!   model's primary-key fields;
//! - remote join fields: a reciprocal association's `targetNames` if one is
//!   declared on the target model, else an explicit `associatedWith` list,
//!   else the target model's primary-key fields.

use crate::schema::Namespace;
use serde::{Deserialize, Serialize};

/// The kind of relationship between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

/// A resolved relationship for one (model, field) pair.
///
/// Derived from schema metadata, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// The relationship field on the local model.
    pub field_name: String,
    /// The local model.
    pub model_name: String,
    /// The relationship kind.
    pub kind: RelationKind,
    /// The related model.
    pub target_model: String,
    /// Join fields on the local model.
    pub local_join_fields: Vec<String>,
    /// Join fields on the target model.
    pub remote_join_fields: Vec<String>,
}

impl Namespace {
    /// Resolves the relationship for a (model, field) pair, or `None` when
    /// the field is not a relationship field.
    #[must_use]
    pub fn resolve_relationship(&self, model_name: &str, field_name: &str) -> Option<Relationship> {
        let model = self.model(model_name)?;
        let field = model.field(field_name)?;
        let assoc = field.association.as_ref()?;
        let target = self.model(&assoc.target_model)?;

        let local_join_fields = match &assoc.target_names {
            Some(names) if !names.is_empty() => names.clone(),
            _ => model.primary_key.clone(),
        };

        // Prefer the reciprocal side's explicit declaration: if the target
        // model declares an association back at us with targetNames, those
        // are its join fields.
        let reciprocal_names = target
            .fields
            .iter()
            .filter_map(|f| f.association.as_ref())
            .find_map(|a| {
                if a.target_model == model_name {
                    a.target_names.clone().filter(|n| !n.is_empty())
                } else {
                    None
                }
            });

        let remote_join_fields = match reciprocal_names {
            Some(names) => names,
            None => match &assoc.associated_with {
                Some(names) if !names.is_empty() => names.clone(),
                _ => target.primary_key.clone(),
            },
        };

        Some(Relationship {
            field_name: field_name.to_string(),
            model_name: model_name.to_string(),
            kind: assoc.kind,
            target_model: assoc.target_model.clone(),
            local_join_fields,
            remote_join_fields,
        })
    }

    /// Resolves every relationship field on a model.
    #[must_use]
    pub fn relationships_of(&self, model_name: &str) -> Vec<Relationship> {
        let Some(model) = self.model(model_name) else {
            return Vec::new();
        };
        model
            .association_fields()
            .filter_map(|f| self.resolve_relationship(model_name, &f.name))
            .collect()
    }
}
