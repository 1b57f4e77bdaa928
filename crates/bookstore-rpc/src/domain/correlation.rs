//! Correlation ID for request tracking.
//!
//! Ids minted here are UUID v7 strings. Ids arriving from peers are opaque
//! tokens: any non-empty string is accepted and echoed back unchanged. On
//! the wire the id travels as the envelope's `relation_id` string.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Rejected relation id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relation id must be a non-empty string")]
pub struct InvalidCallId;

/// Token correlating one outbound request with its eventual response.
///
/// Lives exactly as long as one outstanding call. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId(Arc<str>);

impl CallId {
    /// Generate a new call ID (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string().into())
    }

    /// Accept any non-empty token
    pub fn parse(s: &str) -> Result<Self, InvalidCallId> {
        if s.is_empty() {
            return Err(InvalidCallId);
        }
        Ok(Self(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CallId {
    type Err = InvalidCallId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CallId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CallId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
