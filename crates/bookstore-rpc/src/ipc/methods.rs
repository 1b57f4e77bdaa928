//! Method Table - what this process answers, and how.
//!
//! Built once at startup and never mutated; the dispatcher and every
//! worker share it through an `Arc`.

use crate::domain::envelope::{CallOutcome, RequestEnvelope, ResponseEnvelope};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a handler produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerReply {
    pub result: Value,
    pub outcome: CallOutcome,
}

impl HandlerReply {
    /// Successful reply carrying `result`.
    pub fn ok(result: Value) -> Self {
        Self {
            result,
            outcome: CallOutcome::Ok,
        }
    }

    /// Successful reply; serializes `result`, reporting a failure as invalid input.
    pub fn ok_json<T: Serialize>(result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::ok(value),
            Err(e) => Self::failed(CallOutcome::InvalidInput(e.to_string())),
        }
    }

    /// Failed reply with a null result.
    pub fn failed(outcome: CallOutcome) -> Self {
        Self {
            result: Value::Null,
            outcome,
        }
    }
}

/// Decode a request payload, mapping failures to an `InvalidInput` reply.
pub fn decode_payload<T: DeserializeOwned>(payload: Value) -> Result<T, HandlerReply> {
    serde_json::from_value(payload)
        .map_err(|e| HandlerReply::failed(CallOutcome::InvalidInput(e.to_string())))
}

/// Handler for one method name.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn handle(&self, payload: Value) -> HandlerReply;
}

/// Immutable map from method name to handler.
#[derive(Clone, Default)]
pub struct MethodTable {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodTable {
    pub fn builder() -> MethodTableBuilder {
        MethodTableBuilder::default()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler for `request` and build its response.
    ///
    /// Returns `None` when the method is not in the table.
    pub async fn dispatch(&self, request: &RequestEnvelope) -> Option<ResponseEnvelope> {
        let handler = self.handlers.get(&request.method)?;
        let reply = handler.handle(request.payload.clone()).await;
        Some(ResponseEnvelope::reply_to(request, reply.result, reply.outcome))
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.methods())
            .finish()
    }
}

/// Collects handlers before the table is frozen.
#[derive(Default)]
pub struct MethodTableBuilder {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodTableBuilder {
    /// Add `handler` under `method`, replacing any earlier one.
    pub fn register(mut self, method: impl Into<String>, handler: Arc<dyn MethodHandler>) -> Self {
        self.handlers.insert(method.into(), handler);
        self
    }

    pub fn build(self) -> MethodTable {
        MethodTable {
            handlers: self.handlers,
        }
    }
}
