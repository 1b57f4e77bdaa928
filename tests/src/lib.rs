//! # Bookstore Test Suite
//!
//! Cross-crate flows run against the in-memory broker.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs   # Two-tier fixture: API tier + storage tier on one topic
//!     ├── flows.rs     # Correlation, timeout, delivery and pool behavior
//!     └── books.rs     # Book CRUD through the typed client
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bookstore-tests
//! cargo test -p bookstore-tests integration::flows::
//! ```

#![allow(dead_code)]

pub mod integration;
