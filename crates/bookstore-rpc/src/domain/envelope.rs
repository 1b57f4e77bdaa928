//! Envelope codec.
//!
//! One JSON object per bus message. Requests and responses share the topic
//! and a common header:
//!
//! ```text
//! {"method": "...", "type": "request",  "relation_id": "<token>", "payload": {...}}
//! {"method": "...", "type": "response", "relation_id": "<token>", "result": {...},
//!  "error": {"error": "<discriminant>", "message": "..."}}
//! ```
//!
//! The codec is stateless; callers decide what to do with failures.

use crate::domain::correlation::CallId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Fixed vocabulary of `error.error` values on the wire.
pub mod discriminants {
    /// Business call succeeded.
    pub const OK: &str = "";
    /// No row matched.
    pub const NOT_FOUND: &str = "record not found";
    /// Storage failed.
    pub const DB_OPERATION: &str = "database operation failed";
    /// Payload could not be decoded or validated.
    pub const INVALID_PARAM: &str = "invalid parameter value";
}

/// Envelope direction, the `type` field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Request,
    Response,
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeKind::Request => f.write_str("request"),
            EnvelopeKind::Response => f.write_str("response"),
        }
    }
}

/// Codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Not JSON, or required fields missing / mistyped.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Well-formed, but of the other kind.
    #[error("expected a {expected} envelope, found {found}")]
    UnexpectedKind {
        expected: EnvelopeKind,
        found: EnvelopeKind,
    },
}

/// Business-level result of a request.
///
/// Travels inside a successfully delivered response; never a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Ok,
    NotFound,
    DbError(String),
    InvalidInput(String),
}

impl CallOutcome {
    /// Returns true for [`CallOutcome::Ok`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, CallOutcome::Ok)
    }

    /// Wire form: `(error.error, error.message)`.
    #[must_use]
    pub fn wire_parts(&self) -> (&'static str, &str) {
        match self {
            CallOutcome::Ok => (discriminants::OK, ""),
            CallOutcome::NotFound => (discriminants::NOT_FOUND, ""),
            CallOutcome::DbError(message) => (discriminants::DB_OPERATION, message),
            CallOutcome::InvalidInput(message) => (discriminants::INVALID_PARAM, message),
        }
    }

    /// Inverse of [`wire_parts`](Self::wire_parts).
    ///
    /// Unknown discriminants are reported as storage failures so the caller
    /// still gets a terminal answer.
    #[must_use]
    pub fn from_wire(error: &str, message: &str) -> Self {
        match error {
            discriminants::OK => CallOutcome::Ok,
            discriminants::NOT_FOUND => CallOutcome::NotFound,
            discriminants::DB_OPERATION => CallOutcome::DbError(message.to_string()),
            discriminants::INVALID_PARAM => CallOutcome::InvalidInput(message.to_string()),
            other => CallOutcome::DbError(if message.is_empty() {
                other.to_string()
            } else {
                format!("{other}: {message}")
            }),
        }
    }
}

/// A call published by the Call Façade.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub method: String,
    pub call_id: CallId,
    pub payload: Value,
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, call_id: CallId, payload: Value) -> Self {
        Self {
            method: method.into(),
            call_id,
            payload,
        }
    }
}

/// The answer to one [`RequestEnvelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub method: String,
    pub call_id: CallId,
    pub result: Value,
    pub outcome: CallOutcome,
}

impl ResponseEnvelope {
    /// Build the response to `request`, echoing its method and call id.
    pub fn reply_to(request: &RequestEnvelope, result: Value, outcome: CallOutcome) -> Self {
        Self {
            method: request.method.clone(),
            call_id: request.call_id.clone(),
            result,
            outcome,
        }
    }
}

/// Either kind of envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Request(_) => EnvelopeKind::Request,
            Envelope::Response(_) => EnvelopeKind::Response,
        }
    }

    pub fn call_id(&self) -> &CallId {
        match self {
            Envelope::Request(r) => &r.call_id,
            Envelope::Response(r) => &r.call_id,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Envelope::Request(r) => &r.method,
            Envelope::Response(r) => &r.method,
        }
    }
}

impl From<RequestEnvelope> for Envelope {
    fn from(request: RequestEnvelope) -> Self {
        Envelope::Request(request)
    }
}

impl From<ResponseEnvelope> for Envelope {
    fn from(response: ResponseEnvelope) -> Self {
        Envelope::Response(response)
    }
}

/// Fields common to both kinds; enough to route a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvelopeHeader {
    pub method: String,
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(rename = "relation_id")]
    pub call_id: CallId,
}

// =============================================================================
// WIRE FORMS
// =============================================================================

#[derive(Serialize)]
struct WireRequestRef<'a> {
    method: &'a str,
    #[serde(rename = "type")]
    kind: EnvelopeKind,
    relation_id: &'a CallId,
    payload: &'a Value,
}

#[derive(Deserialize)]
struct WireRequest {
    method: String,
    #[serde(rename = "type")]
    kind: EnvelopeKind,
    relation_id: CallId,
    #[serde(default)]
    payload: Value,
}

#[derive(Serialize)]
struct WireErrorRef<'a> {
    error: &'a str,
    message: &'a str,
}

#[derive(Deserialize, Default)]
struct WireError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct WireResponseRef<'a> {
    method: &'a str,
    #[serde(rename = "type")]
    kind: EnvelopeKind,
    relation_id: &'a CallId,
    result: &'a Value,
    error: WireErrorRef<'a>,
}

#[derive(Deserialize)]
struct WireResponse {
    method: String,
    #[serde(rename = "type")]
    kind: EnvelopeKind,
    relation_id: CallId,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: WireError,
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode an envelope to its JSON wire form.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    let bytes = match envelope {
        Envelope::Request(request) => serde_json::to_vec(&WireRequestRef {
            method: &request.method,
            kind: EnvelopeKind::Request,
            relation_id: &request.call_id,
            payload: &request.payload,
        })?,
        Envelope::Response(response) => {
            let (error, message) = response.outcome.wire_parts();
            serde_json::to_vec(&WireResponseRef {
                method: &response.method,
                kind: EnvelopeKind::Response,
                relation_id: &response.call_id,
                result: &response.result,
                error: WireErrorRef { error, message },
            })?
        }
    };
    Ok(bytes)
}

/// Decode only the routing header.
pub fn decode_header(bytes: &[u8]) -> Result<EnvelopeHeader, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a full request envelope.
pub fn decode_request(bytes: &[u8]) -> Result<RequestEnvelope, CodecError> {
    let wire: WireRequest = serde_json::from_slice(bytes)?;
    if wire.kind != EnvelopeKind::Request {
        return Err(CodecError::UnexpectedKind {
            expected: EnvelopeKind::Request,
            found: wire.kind,
        });
    }
    Ok(RequestEnvelope {
        method: wire.method,
        call_id: wire.relation_id,
        payload: wire.payload,
    })
}

/// Decode a full response envelope.
pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, CodecError> {
    let wire: WireResponse = serde_json::from_slice(bytes)?;
    if wire.kind != EnvelopeKind::Response {
        return Err(CodecError::UnexpectedKind {
            expected: EnvelopeKind::Response,
            found: wire.kind,
        });
    }
    Ok(ResponseEnvelope {
        method: wire.method,
        call_id: wire.relation_id,
        result: wire.result,
        outcome: CallOutcome::from_wire(&wire.error.error, &wire.error.message),
    })
}

/// Decode either kind, dispatching on the header.
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    match decode_header(bytes)?.kind {
        EnvelopeKind::Request => decode_request(bytes).map(Envelope::Request),
        EnvelopeKind::Response => decode_response(bytes).map(Envelope::Response),
    }
}
