//! Query strategy selection, sorting and pagination.
//!
//! The adapter picks the cheapest plan that answers a query:
//!
//! 1. a pure conjunction of equality leaves covering exactly the primary-key
//!    fields becomes a direct key lookup;
//! 2. any other predicate becomes a full-store scan filtered in memory;
//! 3. no predicate but a sort becomes a full scan plus a stable multi-key
//!    sort;
//! 4. no predicate and no sort delegates the limit/offset window to the
//!    engine's native pagination when available, else slices a scan.

use lodestore_predicate::{ModelPredicate, Operand, Operator};
use lodestore_schema::SchemaModel;
use lodestore_types::{Record, RecordKey};
use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort key; keys apply in declared order.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort on a field.
    #[must_use]
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on a field.
    #[must_use]
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Sort and page window for a query.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub sort: Vec<SortSpec>,
    pub page: usize,
    pub limit: Option<usize>,
}

impl Pagination {
    /// A plain limit with no sort, starting at page zero.
    #[must_use]
    pub fn limit(limit: usize) -> Self {
        Self {
            sort: Vec::new(),
            page: 0,
            limit: Some(limit),
        }
    }

    /// A page window.
    #[must_use]
    pub fn window(page: usize, limit: usize) -> Self {
        Self {
            sort: Vec::new(),
            page,
            limit: Some(limit),
        }
    }

    /// Adds sort keys.
    #[must_use]
    pub fn sorted_by(mut self, sort: Vec<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// The half-open slice window `[start, end)` over `len` records.
    #[must_use]
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        match self.limit {
            Some(limit) if limit > 0 => {
                let start = self.page.saturating_mul(limit);
                (start.min(len), start.saturating_add(limit).min(len))
            }
            _ => (0, len),
        }
    }
}

/// Which end of the store `query_one` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOne {
    First,
    Last,
}

/// The strategy chosen for a query, cheapest first.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// Direct lookup of one key.
    KeyLookup(RecordKey),
    /// Full scan filtered through the predicate engine.
    ScanFilter,
    /// Full scan plus in-memory multi-key sort.
    ScanSort,
    /// Limit/offset window, natively paginated when the engine can.
    NativePagination,
}

/// Selects the cheapest plan for a (predicate, pagination) pair.
///
/// The match-all predicate counts as no predicate.
#[must_use]
pub fn plan_query(
    model: &SchemaModel,
    predicate: Option<&ModelPredicate>,
    pagination: Option<&Pagination>,
) -> QueryPlan {
    let group = predicate.and_then(|p| p.as_group());

    if let Some(group) = group {
        if let Some(key) = key_lookup(model, group.as_flat_conjunction()) {
            return QueryPlan::KeyLookup(key);
        }
        return QueryPlan::ScanFilter;
    }

    if pagination.map(|p| !p.sort.is_empty()).unwrap_or(false) {
        return QueryPlan::ScanSort;
    }

    QueryPlan::NativePagination
}

/// A flat equality conjunction covering exactly the primary-key fields
/// yields the key to look up.
fn key_lookup(
    model: &SchemaModel,
    leaves: Option<Vec<&lodestore_predicate::PredicateLeaf>>,
) -> Option<RecordKey> {
    let leaves = leaves?;
    if leaves.len() != model.primary_key.len() {
        return None;
    }
    let mut parts = Vec::with_capacity(model.primary_key.len());
    for pk_field in &model.primary_key {
        let leaf = leaves
            .iter()
            .find(|l| &l.field == pk_field && l.operator == Operator::Eq)?;
        let Operand::Scalar(value) = &leaf.operand else {
            return None;
        };
        parts.push(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }
    // Every leaf must participate; extra non-key leaves disqualify the plan.
    if leaves
        .iter()
        .any(|l| !model.primary_key.contains(&l.field))
    {
        return None;
    }
    Some(RecordKey::from_values(parts))
}

/// Stable multi-key sort honoring each key's direction.
pub fn sort_records(records: &mut [Record], sort: &[SortSpec]) {
    records.sort_by(|a, b| {
        for key in sort {
            let ord = value_cmp(a.get(&key.field), b.get(&key.field));
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Total order over optional JSON scalars: absent/null first, then
/// booleans, numbers, strings; mixed kinds order by that rank.
fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
