//! IPC layer: everything that touches the bus.
//!
//! - `gateway`: the single outbound path
//! - `client`: the Call Façade used by the API tier
//! - `dispatcher`: the single inbound reader
//! - `pool`: bounds concurrently running request handlers
//! - `methods` / `handlers`: what this process answers

pub mod client;
pub mod dispatcher;
pub mod gateway;
pub mod handlers;
pub mod methods;
pub mod pool;

pub use client::RpcClient;
pub use dispatcher::{DispatchError, DispatcherHandle, DispatcherState, InboundDispatcher};
pub use gateway::OutboundGateway;
pub use handlers::book_methods;
pub use methods::{HandlerReply, MethodHandler, MethodTable, MethodTableBuilder};
pub use pool::{PoolClosed, WorkerPool, WorkerSlot};
