//! Connection server subsystem.
//!
//! # Data Flow
//! ```text
//! Acceptor::accept()
//!     → connection_server.rs (accept loop, strategy dispatch)
//!     → handler.rs (split transport, loop Processor::process)
//!         Serial:     awaited inline, next accept waits
//!         Concurrent: spawned task per connection
//!     → processor.rs contract (one request in, one response out)
//! ```
//!
//! # Design Decisions
//! - Strategy is a value chosen at construction, not a subtype
//! - End-of-data is a normal result, not an error
//! - Only acceptor failures leave the accept loop

pub mod connection_server;
pub mod echo;
pub mod handler;
pub mod processor;

pub use connection_server::{ConnectionServer, ServerError, DEFAULT_READ_BUFFER};
pub use echo::EchoProcessor;
pub use handler::HandlingStrategy;
pub use processor::{Exchange, ProcessError, Processor};
