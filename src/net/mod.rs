//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming connection
//!     → listener.rs (TCP accept, connection limits)
//!       or transport.rs ChannelAcceptor (in-process transports)
//!     → Transport handed to the connection server
//!     → connection.rs (ID, lifecycle tracking, outcome counters)
//!
//! Connection States:
//!     Accepting → Handling → Closed
//! ```
//!
//! # Design Decisions
//! - Acceptors are the only source of fatal errors for the server
//! - A transport owns its stream; dropping it closes the connection
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;
pub mod transport;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionOutcome, ConnectionTracker};
pub use listener::{ListenerError, TcpAcceptor, TcpTransport};
pub use transport::{Acceptor, ChannelAcceptor, Transport};
