//! The generic record representation.
//!
//! Every model instance in the local cache is a JSON object carrying its
//! declared fields plus three system fields maintained by the sync
//! machinery: `_version` (optimistic-concurrency token), `_lastChangedAt`
//! (epoch millis) and `_deleted` (tombstone flag). Records are immutable;
//! all mutation goes through copy-on-write constructors.

use crate::{Error, RecordKey, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Optimistic-concurrency token field.
pub const VERSION_FIELD: &str = "_version";
/// Last-changed timestamp field (epoch millis).
pub const LAST_CHANGED_AT_FIELD: &str = "_lastChangedAt";
/// Tombstone flag field.
pub const DELETED_FIELD: &str = "_deleted";

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The kind of a local write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpType {
    Create,
    Update,
    Delete,
}

/// A model instance: declared fields plus sync system fields, stored as a
/// flat JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value; the value must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(Error::NotAnObject),
        }
    }

    /// Returns the record as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Consumes the record, returning the underlying object.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Returns the underlying object.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Gets a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns true if the field is present and non-null.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(v) if !v.is_null())
    }

    /// Copy-on-write: returns a new record with `field` set to `value`.
    #[must_use]
    pub fn with_field(&self, field: impl Into<String>, value: Value) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(field.into(), value);
        Self { fields }
    }

    /// Copy-on-write: returns a new record without `field`.
    #[must_use]
    pub fn without_field(&self, field: &str) -> Self {
        let mut fields = self.fields.clone();
        fields.remove(field);
        Self { fields }
    }

    /// Derives the record's identity from its primary-key fields.
    ///
    /// Values are rendered as strings (unquoted for JSON strings) and joined
    /// with the composite-key separator in declared order.
    pub fn key<S: AsRef<str>>(&self, pk_fields: &[S]) -> Result<RecordKey> {
        let mut parts = Vec::with_capacity(pk_fields.len());
        for field in pk_fields {
            let field = field.as_ref();
            let value = self
                .fields
                .get(field)
                .filter(|v| !v.is_null())
                .ok_or_else(|| Error::MissingKeyField(field.to_string()))?;
            parts.push(render_key_part(value));
        }
        Ok(RecordKey::from_values(parts))
    }

    // ── System fields ────────────────────────────────────────────

    /// The optimistic-concurrency version, if stamped.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        self.fields.get(VERSION_FIELD).and_then(Value::as_i64)
    }

    /// The last-changed timestamp (epoch millis), if stamped.
    #[must_use]
    pub fn last_changed_at(&self) -> Option<i64> {
        self.fields.get(LAST_CHANGED_AT_FIELD).and_then(Value::as_i64)
    }

    /// Whether the record is a tombstone.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.fields
            .get(DELETED_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Copy-on-write: stamps the version token.
    #[must_use]
    pub fn with_version(&self, version: i64) -> Self {
        self.with_field(VERSION_FIELD, Value::from(version))
    }

    /// Copy-on-write: stamps the last-changed timestamp.
    #[must_use]
    pub fn with_last_changed_at(&self, millis: i64) -> Self {
        self.with_field(LAST_CHANGED_AT_FIELD, Value::from(millis))
    }

    /// Copy-on-write: sets the tombstone flag.
    #[must_use]
    pub fn with_deleted(&self, deleted: bool) -> Self {
        self.with_field(DELETED_FIELD, Value::from(deleted))
    }
}

fn render_key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
