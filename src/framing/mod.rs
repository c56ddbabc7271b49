//! Wire framing subsystem.
//!
//! # Data Flow
//! ```text
//! connection byte stream
//!     → header.rs (8-byte header: seq, payload length)
//!     → bounded.rs (BoundedReader limited to the declared length)
//!     → processor consumes the payload
//!     → BoundedReader::close drains whatever the processor left unread
//!     → stream positioned at the next header
//! ```
//!
//! # Design Decisions
//! - Frame length is always known before the payload is read
//! - Reading past a frame is a contract violation, never a short read
//! - Drain-on-close keeps the stream aligned even for sloppy processors

pub mod bounded;
pub mod error;
pub mod header;

pub use bounded::BoundedReader;
pub use error::FrameError;
pub use header::{read_header, write_frame, FrameHeader, HEADER_LEN};
