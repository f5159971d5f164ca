use crate::relationship::RelationKind;
use crate::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The scalar type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Id,
    String,
    Int,
    Float,
    Bool,
    DateTime,
    Json,
}

/// Groups scalar kinds into the families predicate operators are
/// constrained by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    String,
    Numeric,
    Boolean,
    Json,
}

impl ScalarKind {
    /// The operator family this kind belongs to.
    #[must_use]
    pub fn family(&self) -> TypeFamily {
        match self {
            ScalarKind::Id | ScalarKind::String | ScalarKind::DateTime => TypeFamily::String,
            ScalarKind::Int | ScalarKind::Float => TypeFamily::Numeric,
            ScalarKind::Bool => TypeFamily::Boolean,
            ScalarKind::Json => TypeFamily::Json,
        }
    }
}

/// Relationship metadata declared on a model field by codegen.
///
/// Only one side of a relationship is stated explicitly; the resolver
/// infers the other side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAssociation {
    /// The relationship kind as declared.
    #[serde(rename = "connectionType")]
    pub kind: RelationKind,
    /// The related model.
    #[serde(rename = "targetModel")]
    pub target_model: String,
    /// Explicit local join fields, when codegen declares them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "targetNames")]
    pub target_names: Option<Vec<String>>,
    /// Explicit remote field list, when codegen declares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "associatedWith")]
    pub associated_with: Option<Vec<String>>,
}

/// A single field definition on a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelField {
    pub name: String,
    pub kind: ScalarKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<ModelAssociation>,
}

impl ModelField {
    fn simple(name: &str, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            is_array: false,
            read_only: false,
            association: None,
        }
    }

    /// Shorthand for an ID field.
    pub fn id(name: &str) -> Self {
        let mut f = Self::simple(name, ScalarKind::Id);
        f.required = true;
        f
    }

    /// Shorthand for a string field.
    pub fn string(name: &str) -> Self {
        Self::simple(name, ScalarKind::String)
    }

    /// Shorthand for an integer field.
    pub fn int(name: &str) -> Self {
        Self::simple(name, ScalarKind::Int)
    }

    /// Shorthand for a float field.
    pub fn float(name: &str) -> Self {
        Self::simple(name, ScalarKind::Float)
    }

    /// Shorthand for a boolean field.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, ScalarKind::Bool)
    }

    /// Shorthand for a datetime field (ISO-8601 string on the wire).
    pub fn datetime(name: &str) -> Self {
        Self::simple(name, ScalarKind::DateTime)
    }

    /// Marks the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as an array of its scalar kind.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Marks the field read-only (server-managed).
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Attaches relationship metadata to the field.
    #[must_use]
    pub fn with_association(mut self, association: ModelAssociation) -> Self {
        self.association = Some(association);
        self
    }
}

/// A model definition: named fields plus key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaModel {
    pub name: String,
    pub fields: Vec<ModelField>,
    /// Primary-key fields, in declared order. Defaults to `["id"]`.
    #[serde(default = "default_primary_key")]
    pub primary_key: Vec<String>,
    /// Whether the model participates in remote sync.
    #[serde(default = "default_true")]
    pub syncable: bool,
}

fn default_primary_key() -> Vec<String> {
    vec!["id".to_string()]
}

fn default_true() -> bool {
    true
}

impl SchemaModel {
    /// Creates a model with the default `["id"]` primary key.
    pub fn new(name: &str, fields: Vec<ModelField>) -> Self {
        Self {
            name: name.into(),
            fields,
            primary_key: default_primary_key(),
            syncable: true,
        }
    }

    /// Overrides the primary key (possibly composite).
    #[must_use]
    pub fn with_primary_key(mut self, fields: &[&str]) -> Self {
        self.primary_key = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Excludes the model from remote sync.
    #[must_use]
    pub fn local_only(mut self) -> Self {
        self.syncable = false;
        self
    }

    /// Looks up a field definition by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields carrying relationship metadata.
    pub fn association_fields(&self) -> impl Iterator<Item = &ModelField> {
        self.fields.iter().filter(|f| f.association.is_some())
    }
}

/// A namespace: a set of models plus their sync ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub models: BTreeMap<String, SchemaModel>,
    /// Dependency order for sync: parents before children.
    #[serde(rename = "modelTopologicalOrdering")]
    pub model_topological_ordering: Vec<String>,
}

impl Namespace {
    /// Builds a namespace from models; ordering defaults to insertion order
    /// of the given list.
    pub fn new(name: &str, models: Vec<SchemaModel>) -> Self {
        let ordering = models.iter().map(|m| m.name.clone()).collect();
        Self {
            name: name.into(),
            models: models.into_iter().map(|m| (m.name.clone(), m)).collect(),
            model_topological_ordering: ordering,
        }
    }

    /// Overrides the topological ordering.
    #[must_use]
    pub fn with_ordering(mut self, ordering: &[&str]) -> Self {
        self.model_topological_ordering = ordering.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Looks up a model definition.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&SchemaModel> {
        self.models.get(name)
    }

    /// Looks up a model definition, erroring when absent.
    pub fn require_model(&self, name: &str) -> SchemaResult<&SchemaModel> {
        self.model(name)
            .ok_or_else(|| SchemaError::UnknownModel(name.to_string()))
    }

    /// The parent models a model's sync must wait for: the distinct targets
    /// of its `BELONGS_TO` associations.
    #[must_use]
    pub fn sync_parents(&self, model_name: &str) -> Vec<String> {
        let Some(model) = self.model(model_name) else {
            return Vec::new();
        };
        let mut parents = Vec::new();
        for assoc in model.fields.iter().filter_map(|f| f.association.as_ref()) {
            if assoc.kind == RelationKind::BelongsTo
                && assoc.target_model != model_name
                && !parents.contains(&assoc.target_model)
            {
                parents.push(assoc.target_model.clone());
            }
        }
        parents
    }

    /// Checks relationship metadata and the topological ordering once.
    ///
    /// Raised at adapter initialization; a failure here is a configuration
    /// error, never a per-record error.
    pub fn validate(&self) -> SchemaResult<()> {
        for model in self.models.values() {
            for field in model.association_fields() {
                let Some(assoc) = field.association.as_ref() else {
                    continue;
                };
                let target = self.models.get(&assoc.target_model).ok_or_else(|| {
                    SchemaError::UnknownTargetModel {
                        model: model.name.clone(),
                        field: field.name.clone(),
                        target: assoc.target_model.clone(),
                    }
                })?;
                if let Some(names) = &assoc.target_names {
                    for join_field in names {
                        if model.field(join_field).is_none() {
                            return Err(SchemaError::MissingJoinField {
                                model: model.name.clone(),
                                field: field.name.clone(),
                                join_field: join_field.clone(),
                            });
                        }
                    }
                }
                if let Some(names) = &assoc.associated_with {
                    for join_field in names {
                        if target.field(join_field).is_none() {
                            return Err(SchemaError::MissingJoinField {
                                model: target.name.clone(),
                                field: field.name.clone(),
                                join_field: join_field.clone(),
                            });
                        }
                    }
                }
            }
            if model.syncable && !self.model_topological_ordering.contains(&model.name) {
                return Err(SchemaError::OrderingMissingModel(model.name.clone()));
            }
        }
        Ok(())
    }
}

/// The full schema: namespaces loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub namespaces: BTreeMap<String, Namespace>,
}

impl Schema {
    /// Builds a schema from namespaces.
    pub fn new(namespaces: Vec<Namespace>) -> Self {
        Self {
            namespaces: namespaces
                .into_iter()
                .map(|ns| (ns.name.clone(), ns))
                .collect(),
        }
    }

    /// Looks up a namespace.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Validates every namespace.
    pub fn validate(&self) -> SchemaResult<()> {
        for ns in self.namespaces.values() {
            ns.validate()?;
        }
        Ok(())
    }
}
