//! # Bookstore Types Crate
//!
//! Domain entities, bus payloads and storage error types shared by the
//! API tier, the storage tier and the correlation layer between them.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every payload that crosses the bus is
//!   defined here, so both sides of the topic agree on the JSON shape.
//! - **Wire Compatibility**: field names match the JSON keys already in use
//!   on the topic (`user_id`, `relation_id` lives in the envelope).

pub mod entities;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use errors::*;
pub use ipc::*;
