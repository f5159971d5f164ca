//! Remote transport abstraction.
//!
//! The sync processor never talks to the network itself; it hands GraphQL
//! requests to a [`RemoteTransport`] implemented by the caller. Transport
//! errors are classified so the processor knows whether to retry with
//! backoff, advance to the next authorization mode, or abort.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Authorization modes, tried in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMode {
    ApiKey,
    Iam,
    OpenIdConnect,
    UserPool,
    Function,
}

/// A GraphQL request handed to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    /// The query document.
    pub query: String,
    /// The operation name (one per model sync loop).
    pub operation_name: String,
    /// Query variables: limit, nextToken, lastSync, filter.
    pub variables: Value,
    /// Authorization mode for this attempt.
    pub auth_mode: AuthMode,
    /// Opaque credential resolved by the caller, when the mode needs one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// A GraphQL response from the transport.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Errors a transport can surface, classified for retry behavior.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Transient network failure; retried with backoff.
    #[error("network error: {0}")]
    Network(String),

    /// Transient service failure; retried with backoff.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The current auth mode was rejected; the next mode is tried.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Client-side request error; treated like an authorization failure
    /// (no amount of retrying fixes the request).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Anything else is terminal for the model's loop.
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether the error should be retried with backoff under the same
    /// auth mode.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Network(_) | TransportError::ServiceUnavailable(_)
        )
    }

    /// Whether the error advances the auth-mode list.
    #[must_use]
    pub fn is_auth_class(&self) -> bool {
        matches!(
            self,
            TransportError::Unauthorized(_) | TransportError::BadRequest(_)
        )
    }
}

/// Executes remote queries and mutations.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Runs one GraphQL request. Implementations are expected to honor
    /// cooperative cancellation of the surrounding task.
    async fn graphql(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError>;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted transport: queues one response list per operation name and
    /// records every request it sees.
    #[derive(Default)]
    pub struct MockTransport {
        scripted: Mutex<HashMap<String, VecDeque<Result<GraphQlResponse, TransportError>>>>,
        fallback: Mutex<Option<GraphQlResponse>>,
        requests: Mutex<Vec<GraphQlRequest>>,
        latency: Option<Duration>,
    }

    impl MockTransport {
        /// Creates an empty mock.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds artificial latency per call (for cancellation tests).
        #[must_use]
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Queues a response for an operation name.
        pub fn script(&self, operation: &str, result: Result<GraphQlResponse, TransportError>) {
            self.scripted
                .lock()
                .unwrap()
                .entry(operation.to_string())
                .or_default()
                .push_back(result);
        }

        /// Response returned whenever an operation's script is exhausted.
        pub fn set_fallback(&self, response: GraphQlResponse) {
            *self.fallback.lock().unwrap() = Some(response);
        }

        /// Every request seen so far.
        pub fn requests(&self) -> Vec<GraphQlRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Builds a sync-page response.
        #[must_use]
        pub fn page(
            items: Vec<Value>,
            next_token: Option<&str>,
            started_at: i64,
        ) -> GraphQlResponse {
            GraphQlResponse {
                data: Some(json!({
                    "syncPage": {
                        "items": items,
                        "nextToken": next_token,
                        "startedAt": started_at,
                    }
                })),
                errors: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl RemoteTransport for MockTransport {
        async fn graphql(
            &self,
            request: GraphQlRequest,
        ) -> Result<GraphQlResponse, TransportError> {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let operation = request.operation_name.clone();
            self.requests.lock().unwrap().push(request);

            let next = self
                .scripted
                .lock()
                .unwrap()
                .get_mut(&operation)
                .and_then(|q| q.pop_front());
            match next {
                Some(result) => result,
                None => match self.fallback.lock().unwrap().clone() {
                    Some(response) => Ok(response),
                    None => Ok(Self::page(Vec::new(), None, 0)),
                },
            }
        }
    }
}
