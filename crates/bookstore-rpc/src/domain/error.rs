//! Error types of the correlation layer.
//!
//! Two failure axes are kept apart: the transport axis (did the request get
//! out, did an answer come back in time) and the business axis (what the
//! remote handler concluded).

use crate::domain::correlation::CallId;
use crate::domain::envelope::{CallOutcome, CodecError};
use bookstore_bus::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Failure of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The request could not be published. Nothing was sent.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// No response within the deadline; the remote outcome is unknown.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The remote side found no matching record.
    #[error("record not found")]
    NotFound,

    /// The remote storage operation failed.
    #[error("database operation failed: {0}")]
    DbError(String),

    /// Input rejected while encoding, decoding or validating, on either side.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A call with the same id is already pending.
    #[error("call id {0} is already pending")]
    DuplicateCallId(CallId),

    /// The pending entry disappeared before any response arrived.
    #[error("pending call was cancelled")]
    Cancelled,
}

impl CallError {
    /// Transport-axis failure: the request may or may not have been processed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CallError::Transport(_) | CallError::Timeout(_) | CallError::Cancelled
        )
    }

    /// Business-axis failure: the remote side answered.
    #[must_use]
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            CallError::NotFound | CallError::DbError(_) | CallError::InvalidInput(_)
        )
    }

    /// Returns true for [`CallError::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout(_))
    }
}

impl From<CodecError> for CallError {
    fn from(e: CodecError) -> Self {
        CallError::InvalidInput(e.to_string())
    }
}

impl From<RegistryError> for CallError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Duplicate(call_id) => CallError::DuplicateCallId(call_id),
        }
    }
}

impl From<CallOutcome> for Result<(), CallError> {
    fn from(outcome: CallOutcome) -> Self {
        match outcome {
            CallOutcome::Ok => Ok(()),
            CallOutcome::NotFound => Err(CallError::NotFound),
            CallOutcome::DbError(message) => Err(CallError::DbError(message)),
            CallOutcome::InvalidInput(message) => Err(CallError::InvalidInput(message)),
        }
    }
}

/// Correlation registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("call id {0} is already registered")]
    Duplicate(CallId),
}
