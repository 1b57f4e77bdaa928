//! Inbound Dispatcher - the single reader of the shared topic.
//!
//! ```text
//!   topic ──► reader ──┬─ response ──► registry.deliver (inline)
//!                      ├─ request, owned method ──► admission queue
//!                      │        └─► pool slot ──► handler task ──► gateway
//!                      ├─ request, other method ──► ignored
//!                      └─ malformed ──► logged, dropped
//! ```
//!
//! Responses never wait behind request work: the reader only blocks when
//! the admission queue is full, and that queue only holds requests.

use crate::domain::envelope::{self, EnvelopeKind, RequestEnvelope};
use crate::domain::pending::CorrelationRegistry;
use crate::ipc::gateway::OutboundGateway;
use crate::ipc::methods::MethodTable;
use crate::ipc::pool::{WorkerPool, WorkerSlot};
use bookstore_bus::{MessageStream, RawMessage, TransportError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, instrument, warn};

/// Dispatcher lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Running,
    Stopped,
}

/// Failure to bring the dispatcher up.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to subscribe: {0}")]
    Subscribe(#[source] TransportError),
}

/// Reads the topic and routes every message.
pub struct InboundDispatcher {
    gateway: Arc<OutboundGateway>,
    registry: Arc<CorrelationRegistry>,
    methods: Arc<MethodTable>,
    pool: WorkerPool,
    request_backlog: usize,
}

impl InboundDispatcher {
    pub fn new(
        gateway: Arc<OutboundGateway>,
        registry: Arc<CorrelationRegistry>,
        methods: Arc<MethodTable>,
        pool: WorkerPool,
        request_backlog: usize,
    ) -> Self {
        Self {
            gateway,
            registry,
            methods,
            pool,
            request_backlog: request_backlog.max(1),
        }
    }

    /// Subscribe and spawn the reader.
    ///
    /// The subscription is made before this returns, so nothing published
    /// after `start` resolves is missed. A subscribe failure is returned
    /// here rather than logged.
    pub async fn start(self) -> Result<DispatcherHandle, DispatchError> {
        let stream = self
            .gateway
            .transport()
            .subscribe(self.gateway.topic())
            .await
            .map_err(DispatchError::Subscribe)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(DispatcherState::Running);
        let (admit_tx, admit_rx) = mpsc::channel(self.request_backlog);

        info!(
            topic = self.gateway.topic(),
            methods = ?self.methods.methods(),
            workers = self.pool.capacity(),
            backlog = self.request_backlog,
            "Inbound dispatcher started"
        );

        let admission = Admission {
            pool: self.pool.clone(),
            methods: self.methods.clone(),
            gateway: self.gateway.clone(),
        };
        let reader = Reader {
            registry: self.registry,
            methods: self.methods,
            admit: admit_tx,
        };
        let topic = self.gateway.topic().to_string();

        let task = tokio::spawn(async move {
            let _stopped = MarkStopped(state_tx);
            let admission = tokio::spawn(admission.run(admit_rx));

            reader.run(stream, shutdown_rx, &topic).await;

            // Reader dropped its queue sender; admission drains what is left.
            if let Err(e) = admission.await {
                error!(error = %e, "Request admission task failed");
            }
            info!(topic = %topic, "Inbound dispatcher stopped");
        });

        Ok(DispatcherHandle {
            shutdown: shutdown_tx,
            state: state_rx,
            task,
        })
    }
}

/// Publishes `Stopped` when the dispatcher task ends, even by panic.
struct MarkStopped(watch::Sender<DispatcherState>);

impl Drop for MarkStopped {
    fn drop(&mut self) {
        self.0.send_replace(DispatcherState::Stopped);
    }
}

/// Control handle for a running dispatcher.
///
/// Dropping the handle stops the dispatcher as well; keep it for as long as
/// responses must be delivered.
pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<DispatcherState>,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == DispatcherState::Running
    }

    /// Resolves once the dispatcher has stopped for any reason.
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        // Err means the task is gone, which is also stopped.
        let _ = state.wait_for(|s| *s == DispatcherState::Stopped).await;
    }

    /// Stop reading, let admitted requests finish, then return.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Inbound dispatcher task failed");
        }
    }
}

/// The reading half: routes, never runs handlers.
struct Reader {
    registry: Arc<CorrelationRegistry>,
    methods: Arc<MethodTable>,
    admit: mpsc::Sender<RequestEnvelope>,
}

impl Reader {
    #[instrument(name = "dispatcher", skip_all, fields(topic = %topic))]
    async fn run(self, mut stream: MessageStream, mut shutdown: watch::Receiver<bool>, topic: &str) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    info!("Shutdown requested");
                    break;
                }

                next = stream.next() => match next {
                    Some(Ok(message)) => {
                        let Some(request) = self.route(message) else {
                            continue;
                        };
                        // Blocks while the backlog is full.
                        tokio::select! {
                            biased;
                            _ = shutdown.changed() => {
                                info!("Shutdown requested");
                                break;
                            }
                            sent = self.admit.send(request) => {
                                if sent.is_err() {
                                    error!("Request admission closed");
                                    break;
                                }
                            }
                        }
                    }
                    Some(Err(TransportError::Lagged(skipped))) => {
                        warn!(skipped, "Dispatcher lagged, messages lost");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Error reading from topic");
                    }
                    None => {
                        warn!("Topic stream ended");
                        break;
                    }
                }
            }
        }
    }

    /// Deliver responses; return requests this process must answer.
    fn route(&self, message: RawMessage) -> Option<RequestEnvelope> {
        let header = match envelope::decode_header(&message.payload) {
            Ok(header) => header,
            Err(e) => {
                warn!(offset = message.offset, error = %e, "Dropping malformed message");
                return None;
            }
        };

        match header.kind {
            EnvelopeKind::Response => {
                match envelope::decode_response(&message.payload) {
                    Ok(response) => {
                        let call_id = response.call_id.clone();
                        self.registry.deliver(&call_id, response);
                    }
                    Err(e) => warn!(
                        call_id = %header.call_id,
                        method = %header.method,
                        error = %e,
                        "Dropping undecodable response"
                    ),
                }
                None
            }
            EnvelopeKind::Request if !self.methods.contains(&header.method) => {
                debug!(
                    call_id = %header.call_id,
                    method = %header.method,
                    "Ignoring request for a method this process does not serve"
                );
                None
            }
            EnvelopeKind::Request => match envelope::decode_request(&message.payload) {
                Ok(request) => Some(request),
                Err(e) => {
                    warn!(
                        call_id = %header.call_id,
                        method = %header.method,
                        error = %e,
                        "Dropping undecodable request"
                    );
                    None
                }
            },
        }
    }
}

/// The processing half: one pool slot per running handler.
struct Admission {
    pool: WorkerPool,
    methods: Arc<MethodTable>,
    gateway: Arc<OutboundGateway>,
}

impl Admission {
    async fn run(self, mut queue: mpsc::Receiver<RequestEnvelope>) {
        let mut tasks = JoinSet::new();

        while let Some(request) = queue.recv().await {
            let slot = match self.pool.acquire().await {
                Ok(slot) => slot,
                Err(e) => {
                    warn!(call_id = %request.call_id, error = %e, "Dropping request");
                    continue;
                }
            };

            tasks.spawn(serve(
                request,
                slot,
                self.methods.clone(),
                self.gateway.clone(),
            ));

            while let Some(finished) = tasks.try_join_next() {
                reap(finished);
            }
        }

        let remaining = tasks.len();
        if remaining > 0 {
            debug!(remaining, "Waiting for request handlers to finish");
        }
        while let Some(finished) = tasks.join_next().await {
            reap(finished);
        }
    }
}

/// Run one request and publish its response. `_slot` is held until return.
async fn serve(
    request: RequestEnvelope,
    _slot: WorkerSlot,
    methods: Arc<MethodTable>,
    gateway: Arc<OutboundGateway>,
) {
    let Some(response) = methods.dispatch(&request).await else {
        return;
    };

    debug!(
        call_id = %request.call_id,
        method = %request.method,
        ok = response.outcome.is_ok(),
        "Request handled"
    );

    if let Err(e) = gateway.publish(&response.into()).await {
        warn!(
            call_id = %request.call_id,
            method = %request.method,
            error = %e,
            "Failed to publish response, caller will time out"
        );
    }
}

fn reap(finished: Result<(), JoinError>) {
    if let Err(e) = finished {
        if e.is_panic() {
            error!(error = %e, "Request handler panicked");
        } else {
            warn!(error = %e, "Request handler cancelled");
        }
    }
}
