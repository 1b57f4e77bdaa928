//! Correlation Registry - maps call ids to the callers waiting on them.
//!
//! Flow:
//! 1. Call Façade generates a `CallId`
//! 2. Façade calls `register()` to get a single-slot receiver
//! 3. Façade publishes the request carrying the `CallId`
//! 4. Inbound dispatcher reads the response and calls `deliver()`
//! 5. Façade awaits the receiver or times out, then calls `unregister()`
//!
//! The registry is the only state shared between callers and the
//! dispatcher. `deliver` never waits: a response with nobody to take it is
//! logged and dropped.

use crate::domain::correlation::CallId;
use crate::domain::envelope::ResponseEnvelope;
use crate::domain::error::RegistryError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A caller waiting for its response.
struct PendingCall {
    /// Single delivery slot; `None` once a response went through it.
    slot: Option<oneshot::Sender<ResponseEnvelope>>,
    /// When the call was registered
    created_at: Instant,
    /// Method name (for logging)
    method: String,
}

/// What happened to a response handed to [`CorrelationRegistry::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The waiting caller received it.
    Delivered,
    /// No entry: the caller timed out and unregistered, or never existed.
    NoWaiter,
    /// The entry's slot was already used; this is a duplicate.
    AlreadyDelivered,
    /// The entry exists but its caller stopped listening.
    WaiterGone,
}

impl DeliveryOutcome {
    /// True iff a waiter was present and accepted the response.
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == DeliveryOutcome::Delivered
    }
}

/// Counters for the registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total calls registered
    pub registered: AtomicU64,
    /// Responses handed to a waiting caller
    pub delivered: AtomicU64,
    /// Calls that gave up waiting
    pub timeouts: AtomicU64,
    /// Responses for ids with no entry
    pub dropped_no_waiter: AtomicU64,
    /// Responses for ids whose slot was already used
    pub dropped_duplicate: AtomicU64,
    /// Responses whose caller had stopped listening
    pub dropped_waiter_gone: AtomicU64,
}

impl RegistryStats {
    /// Record a caller that stopped waiting because its deadline passed.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// All responses dropped, for any reason.
    pub fn dropped(&self) -> u64 {
        self.dropped_no_waiter.load(Ordering::Relaxed)
            + self.dropped_duplicate.load(Ordering::Relaxed)
            + self.dropped_waiter_gone.load(Ordering::Relaxed)
    }
}

/// Concurrency-safe table of pending calls.
///
/// Constructed once per process and shared by reference between the Call
/// Façade and the Inbound Dispatcher.
#[derive(Default)]
pub struct CorrelationRegistry {
    pending: DashMap<CallId, PendingCall>,
    stats: RegistryStats,
}

impl CorrelationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `call_id` and get the receiving end of its delivery slot.
    ///
    /// Fails if the id is already pending.
    pub fn register(
        &self,
        call_id: CallId,
        method: &str,
    ) -> Result<oneshot::Receiver<ResponseEnvelope>, RegistryError> {
        let (tx, rx) = oneshot::channel();

        match self.pending.entry(call_id.clone()) {
            Entry::Occupied(_) => {
                warn!(call_id = %call_id, method, "Rejected duplicate call id");
                return Err(RegistryError::Duplicate(call_id));
            }
            Entry::Vacant(entry) => {
                entry.insert(PendingCall {
                    slot: Some(tx),
                    created_at: Instant::now(),
                    method: method.to_string(),
                });
            }
        }

        self.stats.registered.fetch_add(1, Ordering::Relaxed);
        debug!(call_id = %call_id, method, "Registered pending call");

        Ok(rx)
    }

    /// Hand `response` to the caller waiting on `call_id`.
    ///
    /// Never blocks. The entry itself stays until the caller unregisters.
    pub fn deliver(&self, call_id: &CallId, response: ResponseEnvelope) -> DeliveryOutcome {
        let (slot, method, waited) = {
            let Some(mut pending) = self.pending.get_mut(call_id) else {
                self.stats.dropped_no_waiter.fetch_add(1, Ordering::Relaxed);
                warn!(
                    call_id = %call_id,
                    method = %response.method,
                    "Dropping response for unknown or expired call id"
                );
                return DeliveryOutcome::NoWaiter;
            };

            let Some(slot) = pending.slot.take() else {
                self.stats.dropped_duplicate.fetch_add(1, Ordering::Relaxed);
                warn!(
                    call_id = %call_id,
                    method = %pending.method,
                    "Dropping duplicate response, slot already filled"
                );
                return DeliveryOutcome::AlreadyDelivered;
            };

            (slot, pending.method.clone(), pending.created_at.elapsed())
        };

        match slot.send(response) {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    call_id = %call_id,
                    method = %method,
                    response_time_ms = waited.as_millis(),
                    "Delivered response to pending call"
                );
                DeliveryOutcome::Delivered
            }
            Err(_) => {
                self.stats.dropped_waiter_gone.fetch_add(1, Ordering::Relaxed);
                debug!(
                    call_id = %call_id,
                    method = %method,
                    "Pending call receiver dropped"
                );
                DeliveryOutcome::WaiterGone
            }
        }
    }

    /// Remove `call_id`. Returns false if it was not pending.
    pub fn unregister(&self, call_id: &CallId) -> bool {
        match self.pending.remove(call_id) {
            Some((_, pending)) => {
                debug!(
                    call_id = %call_id,
                    method = %pending.method,
                    age_ms = pending.created_at.elapsed().as_millis(),
                    "Unregistered pending call"
                );
                true
            }
            None => false,
        }
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a call id is pending
    pub fn is_pending(&self, call_id: &CallId) -> bool {
        self.pending.contains_key(call_id)
    }

    /// Get statistics
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}
