//! The storage adapter.
//!
//! Sits between the data-access API and a [`StorageEngine`]: derives
//! composite keys, resolves the connected-model subgraph on save, selects
//! the cheapest query plan, hydrates `HAS_ONE`/`BELONGS_TO` relations, and
//! cascades deletes through `HAS_ONE`/`HAS_MANY` children.

use crate::engine::StorageEngine;
use crate::query::{plan_query, sort_records, Pagination, QueryOne, QueryPlan};
use crate::{StorageError, StorageResult};
use lodestore_predicate::ModelPredicate;
use lodestore_schema::{Namespace, RelationKind, Relationship, SchemaModel};
use lodestore_types::{OpType, Record, RecordKey};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether a save inserted a new row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
}

/// Relationship-aware storage over one namespace.
pub struct StorageAdapter {
    engine: Arc<dyn StorageEngine>,
    namespace: Namespace,
}

impl StorageAdapter {
    /// Creates an adapter, validating the namespace's relationship metadata
    /// once. A failure here is a configuration error, not a per-record one.
    pub fn new(engine: Arc<dyn StorageEngine>, namespace: Namespace) -> StorageResult<Self> {
        namespace.validate()?;
        Ok(Self { engine, namespace })
    }

    /// The namespace this adapter serves.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }

    fn model(&self, name: &str) -> StorageResult<&SchemaModel> {
        self.namespace
            .model(name)
            .ok_or_else(|| StorageError::UnknownModel(name.to_string()))
    }

    // ── Save ─────────────────────────────────────────────────────

    /// Saves a record and the connected instances embedded in it.
    ///
    /// A supplied condition is evaluated against the currently stored root
    /// before anything is written; a mismatch is fatal with no partial
    /// effect, and a conditioned save of an absent record is a logged no-op.
    ///
    /// Returns each row actually written, with whether it was an insert or
    /// an update. Embedded connected rows are only written when new; the
    /// root row is always written.
    pub async fn save(
        &self,
        model_name: &str,
        record: &Record,
        condition: Option<&ModelPredicate>,
    ) -> StorageResult<Vec<(Record, WriteKind)>> {
        let model = self.model(model_name)?;
        let root_key = record.key(&model.primary_key)?;

        if let Some(condition) = condition {
            match self.engine.get(model_name, &root_key).await? {
                None => {
                    warn!(model = model_name, key = %root_key, "conditioned save of absent record; skipping");
                    return Ok(Vec::new());
                }
                Some(stored) if !condition.matches(&stored) => {
                    return Err(StorageError::ConditionFailed {
                        model: model_name.to_string(),
                        key: root_key.to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        let mut rows = Vec::new();
        self.collect_subgraph(model_name, record.clone(), &mut rows)?;

        let mut written = Vec::new();
        for (row_model, row) in rows {
            let target = self.model(&row_model)?;
            let key = row.key(&target.primary_key)?;
            let existing = self.engine.get(&row_model, &key).await?;

            let is_root = row_model == model_name && key == root_key;
            if !is_root && existing.is_some() {
                // Connected rows are only written when new.
                continue;
            }

            let kind = if existing.is_some() {
                WriteKind::Update
            } else {
                WriteKind::Insert
            };
            self.engine.put(&row_model, key, row.clone()).await?;
            debug!(model = %row_model, ?kind, "saved record");
            written.push((row, kind));
        }
        Ok(written)
    }

    /// Flattens the connected subgraph reachable from `record`.
    ///
    /// Embedded `HAS_ONE`/`BELONGS_TO` instances become rows for their own
    /// stores; the local join fields on the parent are filled in from the
    /// child and the embedded object is stripped from the stored row.
    /// `HAS_MANY` children are never saved eagerly.
    fn collect_subgraph(
        &self,
        model_name: &str,
        record: Record,
        out: &mut Vec<(String, Record)>,
    ) -> StorageResult<()> {
        let mut row = record;
        for rel in self.namespace.relationships_of(model_name) {
            if rel.kind == RelationKind::HasMany {
                continue;
            }
            let Some(embedded) = row.get(&rel.field_name).cloned() else {
                continue;
            };
            if !embedded.is_object() {
                continue;
            }
            let child = Record::from_value(embedded)?;
            for (local, remote) in rel
                .local_join_fields
                .iter()
                .zip(rel.remote_join_fields.iter())
            {
                if let Some(value) = child.get(remote) {
                    row = row.with_field(local.clone(), value.clone());
                }
            }
            row = row.without_field(&rel.field_name);
            self.collect_subgraph(&rel.target_model, child, out)?;
        }
        out.push((model_name.to_string(), row));
        Ok(())
    }

    // ── Query ────────────────────────────────────────────────────

    /// Queries a model store, picking the cheapest strategy (see
    /// [`plan_query`]) and hydrating single-row relations on the results.
    pub async fn query(
        &self,
        model_name: &str,
        predicate: Option<&ModelPredicate>,
        pagination: Option<&Pagination>,
    ) -> StorageResult<Vec<Record>> {
        let model = self.model(model_name)?;
        let plan = plan_query(model, predicate, pagination);

        let records = match &plan {
            QueryPlan::KeyLookup(key) => {
                debug!(model = model_name, key = %key, "query via key lookup");
                self.engine
                    .get(model_name, key)
                    .await?
                    .into_iter()
                    .collect()
            }
            QueryPlan::ScanFilter => {
                let mut records = self.engine.scan(model_name).await?;
                if let Some(predicate) = predicate {
                    records.retain(|r| predicate.matches(r));
                }
                self.sort_and_window(records, pagination)
            }
            QueryPlan::ScanSort => {
                let records = self.engine.scan(model_name).await?;
                self.sort_and_window(records, pagination)
            }
            QueryPlan::NativePagination => match pagination {
                Some(p) if p.limit.is_some() => {
                    let (start, end) = window_unclamped(p);
                    match self.engine.scan_window(model_name, start, end).await? {
                        Some(records) => records,
                        None => {
                            let records = self.engine.scan(model_name).await?;
                            let (start, end) = p.bounds(records.len());
                            records[start..end].to_vec()
                        }
                    }
                }
                _ => self.engine.scan(model_name).await?,
            },
        };

        let mut hydrated = Vec::with_capacity(records.len());
        for record in records {
            hydrated.push(self.hydrate(model_name, record).await?);
        }
        Ok(hydrated)
    }

    /// Returns the first or last record of a store in key order.
    pub async fn query_one(
        &self,
        model_name: &str,
        which: QueryOne,
    ) -> StorageResult<Option<Record>> {
        self.model(model_name)?;
        let records = self.engine.scan(model_name).await?;
        let record = match which {
            QueryOne::First => records.into_iter().next(),
            QueryOne::Last => records.into_iter().next_back(),
        };
        match record {
            Some(r) => Ok(Some(self.hydrate(model_name, r).await?)),
            None => Ok(None),
        }
    }

    fn sort_and_window(&self, mut records: Vec<Record>, pagination: Option<&Pagination>) -> Vec<Record> {
        if let Some(p) = pagination {
            if !p.sort.is_empty() {
                sort_records(&mut records, &p.sort);
            }
            let (start, end) = p.bounds(records.len());
            return records[start..end].to_vec();
        }
        records
    }

    /// Attaches the single related row for each `HAS_ONE`/`BELONGS_TO`
    /// relation, or leaves the field absent when no row matches.
    /// `HAS_MANY` is resolved lazily by an external query, never here.
    async fn hydrate(&self, model_name: &str, record: Record) -> StorageResult<Record> {
        let mut record = record;
        for rel in self.namespace.relationships_of(model_name) {
            if rel.kind == RelationKind::HasMany {
                continue;
            }
            let Some(values) = join_values(&record, &rel.local_join_fields) else {
                continue;
            };
            if let Some(related) = self.related_row(&rel, &values).await? {
                record = record.with_field(rel.field_name.clone(), related.to_value());
            }
        }
        Ok(record)
    }

    /// Finds the row in the relation's target store whose remote join
    /// fields carry `values`. A direct key get when the remote join fields
    /// are the target's primary key, otherwise a scan.
    async fn related_row(
        &self,
        rel: &Relationship,
        values: &[Value],
    ) -> StorageResult<Option<Record>> {
        let target = self.model(&rel.target_model)?;
        if rel.remote_join_fields == target.primary_key {
            let key = RecordKey::from_values(values.iter().map(render_key_part));
            return self.engine.get(&rel.target_model, &key).await;
        }
        let rows = self.engine.scan(&rel.target_model).await?;
        Ok(rows
            .into_iter()
            .find(|row| fields_equal(row, &rel.remote_join_fields, values)))
    }

    async fn rows_matching(
        &self,
        rel: &Relationship,
        values: &[Value],
    ) -> StorageResult<Vec<Record>> {
        let target = self.model(&rel.target_model)?;
        if rel.remote_join_fields == target.primary_key {
            let key = RecordKey::from_values(values.iter().map(render_key_part));
            return Ok(self
                .engine
                .get(&rel.target_model, &key)
                .await?
                .into_iter()
                .collect());
        }
        let rows = self.engine.scan(&rel.target_model).await?;
        Ok(rows
            .into_iter()
            .filter(|row| fields_equal(row, &rel.remote_join_fields, values))
            .collect())
    }

    // ── Delete ───────────────────────────────────────────────────

    /// Deletes one record and every `HAS_ONE`/`HAS_MANY` descendant,
    /// recursively. `BELONGS_TO` parents are never cascaded.
    ///
    /// A supplied condition is validated before traversal begins; a
    /// mismatch aborts the whole delete with no effect. Deleting an absent
    /// record under a condition is a logged no-op with an empty deleted set.
    ///
    /// Returns `(matched, deleted)`: the root rows the request matched and
    /// the full set actually removed, cascade included.
    pub async fn delete(
        &self,
        model_name: &str,
        record: &Record,
        condition: Option<&ModelPredicate>,
    ) -> StorageResult<(Vec<Record>, Vec<Record>)> {
        let model = self.model(model_name)?;
        let key = record.key(&model.primary_key)?;

        let Some(stored) = self.engine.get(model_name, &key).await? else {
            if condition.is_some() {
                warn!(model = model_name, key = %key, "conditioned delete of absent record; skipping");
            } else {
                debug!(model = model_name, key = %key, "delete of absent record");
            }
            return Ok((Vec::new(), Vec::new()));
        };

        if let Some(condition) = condition {
            if !condition.matches(&stored) {
                return Err(StorageError::ConditionFailed {
                    model: model_name.to_string(),
                    key: key.to_string(),
                });
            }
        }

        let deleted = self.cascade_delete(vec![(model_name.to_string(), stored.clone())]).await?;
        Ok((vec![stored], deleted))
    }

    /// Deletes every record matching a predicate, cascading each one.
    pub async fn delete_by_predicate(
        &self,
        model_name: &str,
        predicate: &ModelPredicate,
    ) -> StorageResult<(Vec<Record>, Vec<Record>)> {
        self.model(model_name)?;
        let mut matched = self.engine.scan(model_name).await?;
        matched.retain(|r| predicate.matches(r));

        let roots = matched
            .iter()
            .map(|r| (model_name.to_string(), r.clone()))
            .collect();
        let deleted = self.cascade_delete(roots).await?;
        Ok((matched, deleted))
    }

    /// Computes the full deletion set for the given roots, then removes it.
    ///
    /// The set is collected before any row is removed so a failure while
    /// traversing leaves the store untouched.
    async fn cascade_delete(
        &self,
        roots: Vec<(String, Record)>,
    ) -> StorageResult<Vec<Record>> {
        let mut to_visit = roots;
        let mut seen: HashSet<(String, RecordKey)> = HashSet::new();
        let mut deletion: Vec<(String, RecordKey, Record)> = Vec::new();

        while let Some((model_name, record)) = to_visit.pop() {
            let model = self.model(&model_name)?;
            let key = record.key(&model.primary_key)?;
            if !seen.insert((model_name.clone(), key.clone())) {
                continue;
            }
            for rel in self.namespace.relationships_of(&model_name) {
                if rel.kind == RelationKind::BelongsTo {
                    continue;
                }
                let Some(values) = join_values(&record, &rel.local_join_fields) else {
                    continue;
                };
                for child in self.rows_matching(&rel, &values).await? {
                    to_visit.push((rel.target_model.clone(), child));
                }
            }
            deletion.push((model_name, key, record));
        }

        let mut deleted = Vec::with_capacity(deletion.len());
        for (model_name, key, record) in deletion {
            self.engine.delete(&model_name, &key).await?;
            debug!(model = %model_name, key = %key, "deleted record");
            deleted.push(record);
        }
        Ok(deleted)
    }

    // ── Batch apply & clear ──────────────────────────────────────

    /// Applies a batch of reconciled records in one pass: tombstones remove
    /// the row, everything else is written as an insert or update. Used by
    /// the reconciliation path applying remote pages; no cascade, no
    /// conditions, no outbox involvement.
    pub async fn batch_save(
        &self,
        model_name: &str,
        items: Vec<Record>,
    ) -> StorageResult<Vec<(Record, OpType)>> {
        let model = self.model(model_name)?;
        let mut applied = Vec::with_capacity(items.len());
        for item in items {
            let key = item.key(&model.primary_key)?;
            if item.is_deleted() {
                self.engine.delete(model_name, &key).await?;
                applied.push((item, OpType::Delete));
                continue;
            }
            let op = if self.engine.get(model_name, &key).await?.is_some() {
                OpType::Update
            } else {
                OpType::Create
            };
            self.engine.put(model_name, key, item.clone()).await?;
            applied.push((item, op));
        }
        Ok(applied)
    }

    /// Removes everything from every store.
    pub async fn clear(&self) -> StorageResult<()> {
        self.engine.clear().await
    }
}

/// The values of `fields` on `record`; `None` when any is missing or null.
fn join_values(record: &Record, fields: &[String]) -> Option<Vec<Value>> {
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let value = record.get(field)?.clone();
        if value.is_null() {
            return None;
        }
        values.push(value);
    }
    Some(values)
}

fn fields_equal(record: &Record, fields: &[String], values: &[Value]) -> bool {
    fields
        .iter()
        .zip(values.iter())
        .all(|(field, value)| record.get(field) == Some(value))
}

fn render_key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The unclamped `[start, end)` window for native pagination.
fn window_unclamped(p: &Pagination) -> (usize, usize) {
    let limit = p.limit.unwrap_or(0);
    let start = p.page.saturating_mul(limit);
    (start, start.saturating_add(limit))
}
