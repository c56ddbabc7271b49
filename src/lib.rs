//! Connection handling and wire framing core for an RPC transport.
//!
//! - [`server`]: accept loop driving a shared [`server::Processor`] over each connection
//! - [`framing`]: frame headers and the length-bounded [`framing::BoundedReader`]
//! - [`identity`]: weakly-held surrogate IDs for objects passed by reference

// Core subsystems
pub mod framing;
pub mod identity;
pub mod net;
pub mod server;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use framing::{BoundedReader, FrameError};
pub use identity::{ObjectId, ObjectIdRegistry};
pub use lifecycle::Shutdown;
pub use net::{Acceptor, ChannelAcceptor, Transport};
pub use server::{ConnectionServer, Exchange, HandlingStrategy, ProcessError, Processor, ServerError};
