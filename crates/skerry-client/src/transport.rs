//! Transport abstraction and the in-memory implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::ClientError;
use crate::request::{Method, Payload, Request, Response};

/// Carries management requests to a backing endpoint.
///
/// Implementations resolve the request's path against their own root; a
/// non-success answer surfaces as [`ClientError::Api`] so callers can react
/// to the status without inspecting response bodies.
pub trait Transport {
    /// Executes one request and returns the decoded response.
    fn invoke(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, ClientError>> + Send;
}

#[derive(Default)]
struct MemoryState {
    docs: HashMap<String, Payload>,
    failures: HashMap<String, (u16, String)>,
    requests: Vec<Request>,
}

/// In-memory transport for tests and local experiments.
///
/// Documents are stored by path: `GET` returns the stored payload (404 when
/// absent), `PUT` and `POST` store the request payload, `PATCH`
/// shallow-merges JSON objects, `DELETE` removes. A `POST` without a body
/// answers with the stored payload, which models action endpoints with
/// canned responses. Every request is recorded for inspection, and
/// individual paths can be scripted to fail.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryTransport {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `payload` at `path`.
    pub async fn put_doc(&self, path: impl Into<String>, payload: Payload) {
        self.state.write().await.docs.insert(path.into(), payload);
    }

    /// Stores a JSON document at `path`.
    pub async fn put_json(&self, path: impl Into<String>, value: Value) {
        self.put_doc(path, Payload::Json(value)).await;
    }

    /// Makes every request to `path` fail with an API error.
    pub async fn fail_path(
        &self,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) {
        self.state
            .write()
            .await
            .failures
            .insert(path.into(), (status, message.into()));
    }

    /// Current payload stored at `path`, if any.
    pub async fn doc(&self, path: &str) -> Option<Payload> {
        self.state.read().await.docs.get(path).cloned()
    }

    /// All requests seen so far, in order.
    pub async fn requests(&self) -> Vec<Request> {
        self.state.read().await.requests.clone()
    }

    /// Requests seen for `method` on `path`, in order.
    pub async fn requests_for(&self, method: Method, path: &str) -> Vec<Request> {
        self.state
            .read()
            .await
            .requests
            .iter()
            .filter(|request| request.method() == method && request.path() == path)
            .cloned()
            .collect()
    }
}

impl Transport for MemoryTransport {
    async fn invoke(&self, request: Request) -> Result<Response, ClientError> {
        let path = request.path();
        let mut state = self.state.write().await;
        state.requests.push(request.clone());

        if let Some((status, message)) = state.failures.get(&path) {
            return Err(ClientError::Api {
                status: *status,
                message: message.clone(),
            });
        }

        match request.method() {
            Method::Get => state
                .docs
                .get(&path)
                .cloned()
                .map(|payload| Response {
                    status: 200,
                    payload,
                })
                .ok_or_else(|| ClientError::Api {
                    status: 404,
                    message: format!("not found: {path}"),
                }),
            Method::Put => {
                state.docs.insert(path, request.payload().clone());
                Ok(Response {
                    status: 200,
                    payload: Payload::Empty,
                })
            }
            Method::Patch => {
                let merged = merge_payload(state.docs.get(&path), request.payload());
                state.docs.insert(path, merged);
                Ok(Response {
                    status: 200,
                    payload: Payload::Empty,
                })
            }
            Method::Post => {
                if request.payload().is_empty() {
                    let payload = state.docs.get(&path).cloned().unwrap_or(Payload::Empty);
                    return Ok(Response {
                        status: 200,
                        payload,
                    });
                }
                state.docs.insert(path, request.payload().clone());
                Ok(Response {
                    status: 200,
                    payload: Payload::Empty,
                })
            }
            Method::Delete => {
                if state.docs.remove(&path).is_some() {
                    Ok(Response {
                        status: 200,
                        payload: Payload::Empty,
                    })
                } else {
                    Err(ClientError::Api {
                        status: 404,
                        message: format!("not found: {path}"),
                    })
                }
            }
        }
    }
}

fn merge_payload(existing: Option<&Payload>, incoming: &Payload) -> Payload {
    if let (Some(Payload::Json(base)), Payload::Json(update)) = (existing, incoming) {
        if let (Some(base), Some(update)) = (base.as_object(), update.as_object()) {
            let mut merged = base.clone();
            for (key, value) in update {
                merged.insert(key.clone(), value.clone());
            }
            return Payload::Json(Value::Object(merged));
        }
    }
    incoming.clone()
}
