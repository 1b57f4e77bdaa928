//! Call Façade - turns a publish/subscribe bus into an awaitable call.
//!
//! Each call: fresh id, register, publish once, wait for the slot or the
//! deadline, map the outcome. The pending entry is removed on every exit
//! path, including when the calling future is dropped mid-wait.

use crate::domain::correlation::CallId;
use crate::domain::envelope::RequestEnvelope;
use crate::domain::error::CallError;
use crate::domain::pending::CorrelationRegistry;
use crate::ipc::gateway::OutboundGateway;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Removes a pending entry when the call ends, however it ends.
struct PendingGuard<'a> {
    registry: &'a CorrelationRegistry,
    call_id: CallId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.registry.unregister(&self.call_id);
    }
}

/// Client side of the correlation layer.
#[derive(Clone)]
pub struct RpcClient {
    registry: Arc<CorrelationRegistry>,
    gateway: Arc<OutboundGateway>,
    default_timeout: Duration,
}

impl RpcClient {
    pub fn new(
        registry: Arc<CorrelationRegistry>,
        gateway: Arc<OutboundGateway>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            gateway,
            default_timeout,
        }
    }

    /// Registry shared with the dispatcher delivering this client's responses.
    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Invoke `method` and wait up to `timeout` for its response.
    ///
    /// Publishes exactly once. A transport failure is returned before any
    /// waiting; a timeout says nothing about whether the remote side ran.
    pub async fn invoke(
        &self,
        method: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        let call_id = CallId::new();
        let rx = self.registry.register(call_id.clone(), method)?;
        let _guard = PendingGuard {
            registry: &self.registry,
            call_id: call_id.clone(),
        };

        let request = RequestEnvelope::new(method, call_id.clone(), payload);
        self.gateway.publish(&request.into()).await?;

        debug!(call_id = %call_id, method, timeout_ms = timeout.as_millis(), "Awaiting response");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => {
                Result::<(), CallError>::from(response.outcome)?;
                Ok(response.result)
            }
            Ok(Err(_)) => {
                // Sender dropped without a value
                Err(CallError::Cancelled)
            }
            Err(_) => {
                self.registry.stats().record_timeout();
                warn!(
                    call_id = %call_id,
                    method,
                    timeout_ms = timeout.as_millis(),
                    "Call timed out"
                );
                Err(CallError::Timeout(timeout))
            }
        }
    }

    /// [`invoke`](Self::invoke) with the configured default timeout.
    pub async fn invoke_default(&self, method: &str, payload: Value) -> Result<Value, CallError> {
        self.invoke(method, payload, self.default_timeout).await
    }

    /// Typed call with the default timeout.
    pub async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, CallError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.call_with_timeout(method, request, self.default_timeout)
            .await
    }

    /// Typed call. Serde failures on this side are reported as invalid input.
    pub async fn call_with_timeout<Req, Res>(
        &self,
        method: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Res, CallError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let payload =
            serde_json::to_value(request).map_err(|e| CallError::InvalidInput(e.to_string()))?;
        let result = self.invoke(method, payload, timeout).await?;
        serde_json::from_value(result).map_err(|e| CallError::InvalidInput(e.to_string()))
    }
}
