//! # Bookstore Bus - Topic Transport
//!
//! The one-way publish/subscribe medium both tiers of the bookstore talk
//! through. A single topic carries requests and responses in both
//! directions; correlation is the job of the layer above.
//!
//! ```text
//! ┌──────────────┐   publish() + ack   ┌──────────────┐   subscribe()   ┌──────────────┐
//! │  API tier    │ ──────────────────→ │    Topic     │ ──────────────→ │ Storage tier │
//! │              │ ←────────────────── │   "books"    │ ←────────────── │              │
//! └──────────────┘     subscribe()     └──────────────┘ publish() + ack └──────────────┘
//! ```
//!
//! ## Contract
//!
//! - `publish` resolves only after the broker acknowledged the message.
//! - `subscribe` yields an unbounded stream of raw messages; it only ends
//!   when the broker goes away.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod message;
pub mod subscriber;
pub mod transport;

// Re-export main types
pub use broker::InMemoryBroker;
pub use message::{Delivery, RawMessage};
pub use subscriber::TopicStream;
pub use transport::{MessageStream, Transport, TransportError};

/// Messages to buffer per subscriber before the slowest one starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Topic shared by book requests and responses.
pub const DEFAULT_TOPIC: &str = "books";
