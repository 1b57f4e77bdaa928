#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Bookstore RPC - request/response correlation over a publish/subscribe bus.
//!
//! A single topic carries both directions. Callers publish a tagged request
//! and resume when the matching response arrives or their deadline passes;
//! one reader per process routes responses to waiting callers and hands the
//! requests this process serves to a bounded pool of workers.
//!
//! # Architecture
//!
//! ```text
//!  RpcClient ──► OutboundGateway ──► topic ──► InboundDispatcher (remote)
//!      ▲                                            │
//!      │                                   WorkerPool ─► MethodTable ─► BookStorage
//!      │                                            │
//!  CorrelationRegistry ◄── InboundDispatcher ◄── topic ◄── OutboundGateway (reply)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bookstore_rpc::{book_methods, InMemoryBookStorage, RpcConfig, RpcEndpoint};
//!
//! let methods = book_methods(Arc::new(InMemoryBookStorage::new()));
//! let endpoint = RpcEndpoint::start(transport, methods, &RpcConfig::default()).await?;
//! let pong = endpoint.client().invoke_default("Ping", json!(null)).await?;
//! ```
//!
//! # Guarantees
//!
//! - At most one response is delivered per call id
//! - Every pending entry is removed when its call ends, however it ends
//! - Request handlers never delay response delivery

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod endpoint;
pub mod ipc;
pub mod ports;
pub mod service;

pub use adapters::InMemoryBookStorage;
pub use domain::config::{ConfigError, RpcConfig};
pub use domain::correlation::{CallId, InvalidCallId};
pub use domain::envelope::{
    CallOutcome, CodecError, Envelope, EnvelopeKind, RequestEnvelope, ResponseEnvelope,
};
pub use domain::error::{CallError, RegistryError};
pub use domain::pending::{CorrelationRegistry, DeliveryOutcome, RegistryStats};
pub use endpoint::{EndpointError, RpcEndpoint};
pub use ipc::{
    book_methods, DispatchError, DispatcherHandle, DispatcherState, HandlerReply,
    InboundDispatcher, MethodHandler, MethodTable, OutboundGateway, RpcClient, WorkerPool,
    WorkerSlot,
};
pub use ports::BookStorage;
pub use service::BookService;
