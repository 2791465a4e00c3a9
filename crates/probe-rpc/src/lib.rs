//! # probe-rpc
//!
//! Async RPC runtime for generated remote-debugging protocol clients.
//!
//! Generated invocation methods execute against a [`Connection`]: one
//! duplex message channel carrying outbound requests and an inbound mix of
//! responses and unsolicited events. The connection assigns request ids
//! from a monotonic counter, correlates each response to its waiter, and
//! fans every event out to all subscriptions of that event name.
//!
//! # Architecture
//!
//! ```text
//! invocation tasks ──┐                         ┌─> pending waiter (by id)
//!                    ├─> outbound mpsc ─> transport ─> inbound mpsc ─> reader task ─┤
//! invocation tasks ──┘                         └─> event subscribers (by name)
//! ```
//!
//! The transport itself (WebSocket handshake, frame I/O) lives outside this
//! crate; anything that moves whole text frames between the two mpsc
//! channels and a remote endpoint will do. Tests drive the runtime with
//! bare channel pairs.
//!
//! # Example
//!
//! ```rust,ignore
//! let (out_tx, out_rx) = mpsc::channel(64);
//! let (in_tx, in_rx) = mpsc::channel(64);
//! // wire out_rx/in_tx to the transport...
//!
//! let connection = Connection::new(out_tx, in_rx);
//! let returns: CreateTargetReturns = connection
//!     .invoke("Target.createTarget", Some(params))
//!     .await?;
//! ```

mod connection;
mod error;
mod message;
mod subscription;

pub use connection::Connection;
pub use error::{Result, RpcError};
pub use message::{ErrorObject, EventMessage, InboundMessage, Request, Response};
pub use subscription::EventStream;
