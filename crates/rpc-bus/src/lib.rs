//! # RPC Bus - Session and Notification Dispatch
//!
//! Connects typed messages to an opaque transport: sends requests and
//! notifications, pairs responses with the requests that caused them, and
//! routes inbound notifications to registered handlers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  send_request()   ┌──────────────┐   Transport::send
//! │ Application  │ ────────────────→ │  RpcSession  │ ─────────────────→ link
//! │              │ ←──────────────── │              │
//! └──────────────┘  handlers /       │  registry    │ ←───────────────── link
//!                   PendingResponse  │  pending     │   InboundSink::deliver
//!                                    │  dispatcher  │
//!                                    └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Ordered dispatch:** one task drains inbound frames in arrival order.
//! - **Nothing hangs:** waiting requests resolve on response, timeout, or
//!   `Cancelled` when the session stops.
//! - **Fault isolation:** a failing or panicking handler is logged; the other
//!   handlers still run.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod lifecycle;
pub mod pending;
pub mod registry;
pub mod session;
pub mod telemetry;
pub mod transport;

/// Recording transport and frame helpers.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{LoggingConfig, SessionConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use errors::{HandlerError, SessionError};
pub use lifecycle::{LifecycleError, LifecycleState};
pub use pending::{PendingRequestStore, PendingResponse};
pub use registry::{HandlerId, ListenerRegistry, NotificationHandler};
pub use session::{
    InboundSink, InitialSequence, OutboundMessage, RpcSession, RpcSessionBuilder, SessionListener,
};
pub use transport::{JsonCodec, Transport, TransportError, WireCodec};
