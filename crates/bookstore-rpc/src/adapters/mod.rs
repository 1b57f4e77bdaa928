//! Adapters: infrastructure implementations of the ports.

pub mod memory_storage;

pub use memory_storage::InMemoryBookStorage;
