//! Domain layer: correlation ids, envelopes, pending calls, errors, config.

pub mod config;
pub mod correlation;
pub mod envelope;
pub mod error;
pub mod pending;
