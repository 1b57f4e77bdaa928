//! Ports: traits for the collaborators this crate does not own.

pub mod outbound;

pub use outbound::BookStorage;
