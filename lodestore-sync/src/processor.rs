//! The sync processor.
//!
//! Spawns one paging loop per syncable model, ordered so that a model's
//! `BELONGS_TO` parents finish before the model starts. Pages are pushed
//! into a single channel for the caller to reconcile into local storage.

use crate::backoff::backoff_delay;
use crate::page::{RemotePage, SyncPage};
use crate::transport::{AuthMode, GraphQlRequest, RemoteTransport};
use crate::{SyncError, SyncResult};
use lodestore_predicate::{to_remote_filter, ModelPredicate};
use lodestore_schema::Namespace;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Handler invoked for non-fatal sync errors (a model degrading after
/// authorization exhaustion, or a model's loop aborting).
pub type ErrorHandler = Arc<dyn Fn(&SyncError) + Send + Sync>;

/// Tuning knobs for a sync run.
#[derive(Clone)]
pub struct SyncConfig {
    /// Requested page size.
    pub page_size: u32,
    /// Ceiling on records fetched per model per run.
    pub max_records_per_model: usize,
    /// Authorization modes, tried in order until one is accepted.
    pub auth_modes: Vec<AuthMode>,
    /// Base backoff delay for transient transport errors.
    pub base_delay_ms: u64,
    /// Backoff ceiling.
    pub max_delay_ms: u64,
    /// Retries per auth mode for transient errors.
    pub max_retries: u32,
    /// Optional per-model server-side filters.
    pub sync_filters: HashMap<String, ModelPredicate>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_records_per_model: 10_000,
            auth_modes: vec![AuthMode::ApiKey],
            base_delay_ms: 100,
            max_delay_ms: 30_000,
            max_retries: 3,
            sync_filters: HashMap::new(),
        }
    }
}

/// Orchestrates the per-model sync loops for one namespace.
pub struct SyncProcessor {
    namespace: Arc<Namespace>,
    transport: Arc<dyn RemoteTransport>,
    config: SyncConfig,
    cancel: Mutex<CancellationToken>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    error_handler: Option<ErrorHandler>,
}

impl SyncProcessor {
    pub fn new(
        namespace: Arc<Namespace>,
        transport: Arc<dyn RemoteTransport>,
        config: SyncConfig,
    ) -> Self {
        Self {
            namespace,
            transport,
            config,
            cancel: Mutex::new(CancellationToken::new()),
            tasks: Mutex::new(Vec::new()),
            error_handler: None,
        }
    }

    /// Registers a handler for non-fatal errors. Fatal configuration errors
    /// still surface through [`SyncProcessor::start`].
    #[must_use]
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Starts a sync run and returns the page stream.
    ///
    /// `last_sync_times` maps model names to the `startedAt` of their last
    /// completed sync; models absent from the map run a full (base) sync.
    /// A processor can be started again after [`SyncProcessor::stop`].
    pub fn start(&self, last_sync_times: HashMap<String, i64>) -> mpsc::Receiver<SyncPage> {
        let cancel = CancellationToken::new();
        *self.cancel.lock().unwrap() = cancel.clone();

        let (tx, rx) = mpsc::channel(32);

        // One completion flag per syncable model, used to gate children on
        // their BELONGS_TO parents.
        let mut done_flags: HashMap<String, (watch::Sender<bool>, watch::Receiver<bool>)> =
            HashMap::new();
        for name in &self.namespace.model_topological_ordering {
            let syncable = self
                .namespace
                .model(name)
                .map(|m| m.syncable)
                .unwrap_or(false);
            if syncable {
                done_flags.insert(name.clone(), watch::channel(false));
            }
        }

        let mut tasks = Vec::new();
        for name in &self.namespace.model_topological_ordering {
            let Some((done_tx, _)) = done_flags.get(name) else {
                continue;
            };
            let parents: Vec<watch::Receiver<bool>> = self
                .namespace
                .sync_parents(name)
                .iter()
                .filter_map(|parent| done_flags.get(parent).map(|(_, rx)| rx.clone()))
                .collect();

            let task = ModelSyncTask {
                namespace: self.namespace.name.clone(),
                model: name.clone(),
                transport: Arc::clone(&self.transport),
                config: self.config.clone(),
                last_sync: last_sync_times.get(name).copied(),
                filter: self
                    .config
                    .sync_filters
                    .get(name)
                    .and_then(to_remote_filter),
                parents,
                done: done_tx.clone(),
                cancel: cancel.child_token(),
                tx: tx.clone(),
                error_handler: self.error_handler.clone(),
            };
            tasks.push(tokio::spawn(task.run()));
        }
        info!(
            namespace = %self.namespace.name,
            models = tasks.len(),
            "sync started"
        );
        *self.tasks.lock().unwrap() = tasks;
        rx
    }

    /// Cancels the current run and waits for every model loop to drain.
    pub async fn stop(&self) {
        self.cancel.lock().unwrap().cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
        for task in tasks {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(%err, "sync task panicked during shutdown");
                }
            }
        }
        debug!(namespace = %self.namespace.name, "sync stopped");
    }
}

/// Signals a model's completion flag on every exit path so downstream
/// models are never gated forever.
struct DoneGuard(watch::Sender<bool>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let _ = self.0.send(true);
    }
}

struct ModelSyncTask {
    namespace: String,
    model: String,
    transport: Arc<dyn RemoteTransport>,
    config: SyncConfig,
    last_sync: Option<i64>,
    filter: Option<Value>,
    parents: Vec<watch::Receiver<bool>>,
    done: watch::Sender<bool>,
    cancel: CancellationToken,
    tx: mpsc::Sender<SyncPage>,
    error_handler: Option<ErrorHandler>,
}

impl ModelSyncTask {
    async fn run(mut self) {
        let guard = DoneGuard(self.done.clone());

        // Wait for every BELONGS_TO parent to finish its pages first.
        for parent in &mut self.parents {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = parent.wait_for(|done| *done) => {
                    // A dropped sender means the parent task is gone, which
                    // counts as finished.
                    let _ = result;
                }
            }
        }

        match self.page_loop().await {
            Ok(()) => {}
            Err(SyncError::Cancelled) => {
                debug!(model = %self.model, "model sync cancelled");
            }
            Err(err) => {
                error!(model = %self.model, %err, "model sync aborted");
                if let Some(handler) = &self.error_handler {
                    handler(&err);
                }
            }
        }
        drop(guard);
    }

    async fn page_loop(&self) -> SyncResult<()> {
        let mut next_token: Option<String> = None;
        let mut started_at = self.last_sync.unwrap_or_default();
        let mut total = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let page = self.retrieve_page(next_token.take()).await?;
            if let Some(millis) = page.started_at {
                started_at = millis;
            }
            total += page.items.len();
            next_token = page.next_token;

            let done = next_token.is_none() || total >= self.config.max_records_per_model;
            if done && total >= self.config.max_records_per_model {
                warn!(
                    model = %self.model,
                    total,
                    limit = self.config.max_records_per_model,
                    "record ceiling reached, truncating sync"
                );
            }

            let sync_page = SyncPage {
                namespace: self.namespace.clone(),
                model_name: self.model.clone(),
                items: page.items,
                done,
                started_at,
                is_full_sync: self.last_sync.is_none(),
            };
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(SyncError::Cancelled),
                sent = self.tx.send(sync_page) => {
                    if sent.is_err() {
                        // Receiver dropped; nobody is listening anymore.
                        return Err(SyncError::Cancelled);
                    }
                }
            }
            if done {
                debug!(model = %self.model, total, "model sync complete");
                return Ok(());
            }
        }
    }

    /// Fetches one page, walking the auth-mode list.
    ///
    /// Transient errors are retried with jittered backoff under the same
    /// mode; authorization-class errors advance to the next mode. When
    /// every mode is rejected the model degrades to an empty final page so
    /// it cannot block models gated behind it.
    async fn retrieve_page(&self, next_token: Option<String>) -> SyncResult<RemotePage> {
        for auth_mode in &self.config.auth_modes {
            let mut attempt = 0u32;
            loop {
                if self.cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }
                let request = self.build_request(*auth_mode, next_token.clone());
                let result = tokio::select! {
                    _ = self.cancel.cancelled() => return Err(SyncError::Cancelled),
                    result = self.transport.graphql(request) => result,
                };
                match result {
                    Ok(response) => return RemotePage::parse(&self.model, &response),
                    Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                        let delay = backoff_delay(
                            attempt,
                            self.config.base_delay_ms,
                            self.config.max_delay_ms,
                        );
                        debug!(model = %self.model, %err, attempt, ?delay, "retrying after transient error");
                        tokio::select! {
                            _ = self.cancel.cancelled() => return Err(SyncError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        attempt += 1;
                    }
                    Err(err) if err.is_auth_class() => {
                        debug!(model = %self.model, mode = ?auth_mode, %err, "auth mode rejected");
                        break;
                    }
                    Err(err) => return Err(SyncError::Transport(err)),
                }
            }
        }

        warn!(model = %self.model, "every auth mode rejected, degrading to empty page");
        if let Some(handler) = &self.error_handler {
            handler(&SyncError::AuthExhausted {
                model: self.model.clone(),
            });
        }
        Ok(RemotePage::empty())
    }

    fn build_request(&self, auth_mode: AuthMode, next_token: Option<String>) -> GraphQlRequest {
        let operation_name = format!("Sync{}", self.model);
        let query = format!(
            "query {operation_name}($filter: Filter, $limit: Int, $nextToken: String, $lastSync: Timestamp) {{\n  sync{}(filter: $filter, limit: $limit, nextToken: $nextToken, lastSync: $lastSync) {{\n    items\n    nextToken\n    startedAt\n  }}\n}}",
            self.model,
        );
        GraphQlRequest {
            query,
            operation_name,
            variables: json!({
                "filter": self.filter,
                "limit": self.config.page_size,
                "nextToken": next_token,
                "lastSync": self.last_sync,
            }),
            auth_mode,
            auth_token: None,
        }
    }
}
