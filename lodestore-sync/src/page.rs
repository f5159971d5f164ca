//! Sync page types.

use crate::{SyncError, SyncResult};
use crate::transport::GraphQlResponse;
use lodestore_types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of remote records for a model, as emitted downstream to the
/// reconciliation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPage {
    /// The namespace the model belongs to.
    pub namespace: String,
    /// The model this page belongs to.
    pub model_name: String,
    /// Records in the page, tombstones included.
    pub items: Vec<Record>,
    /// True on the model's final page of this sync run.
    pub done: bool,
    /// Server-reported sync start time (epoch millis).
    pub started_at: i64,
    /// True when the model had no previous sync time (base sync).
    pub is_full_sync: bool,
}

/// A raw page as parsed from the transport response.
#[derive(Debug, Clone, Default)]
pub(crate) struct RemotePage {
    pub items: Vec<Record>,
    pub next_token: Option<String>,
    pub started_at: Option<i64>,
}

impl RemotePage {
    /// The degraded empty page: zero items, no token.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Extracts the page payload from a GraphQL response. The page object
    /// is the single entry under `data`, carrying `items`, `nextToken` and
    /// `startedAt`.
    pub(crate) fn parse(model: &str, response: &GraphQlResponse) -> SyncResult<Self> {
        let data = response.data.as_ref().ok_or_else(|| SyncError::Remote {
            model: model.to_string(),
            message: response
                .errors
                .first()
                .cloned()
                .unwrap_or_else(|| "empty response".to_string()),
        })?;

        let payload = data
            .as_object()
            .and_then(|o| o.values().next())
            .ok_or_else(|| SyncError::Remote {
                model: model.to_string(),
                message: "response data holds no page".to_string(),
            })?;

        let items = payload
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| Record::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            items,
            next_token: payload
                .get("nextToken")
                .and_then(Value::as_str)
                .map(str::to_string),
            started_at: payload.get("startedAt").and_then(Value::as_i64),
        })
    }
}
