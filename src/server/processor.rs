//! Processor contract.
//!
//! A processor consumes exactly one request from its input and writes
//! exactly one response to its output per call. The server drives it in a
//! loop and never looks at its state.

use std::future::Future;
use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::framing::FrameError;

/// Result of one successful processor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// A request was consumed and its response written.
    Completed,
    /// The peer has no further requests; the connection ends normally.
    EndOfData,
}

/// Errors a processor call can end with.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// Frame contract violation; the stream can no longer be trusted.
    #[error("framing error: {0}")]
    Frame(#[source] FrameError),

    /// Malformed request content.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<FrameError> for ProcessError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => ProcessError::Io(e),
            other => ProcessError::Frame(other),
        }
    }
}

impl ProcessError {
    /// Whether this error means the peer went away.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProcessError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Protocol logic driven by the connection server.
///
/// One instance is shared by every connection, so implementations must not
/// keep per-connection mutable state.
pub trait Processor: Send + Sync + 'static {
    /// Consume one request from `input` and write one response to `output`.
    ///
    /// Returns [`Exchange::EndOfData`] when the input ends cleanly before a
    /// new request starts. The server flushes `output` after each
    /// completed exchange.
    fn process<R, W>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> impl Future<Output = Result<Exchange, ProcessError>> + Send
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_kinds() {
        let reset: ProcessError = io::Error::from(io::ErrorKind::ConnectionReset).into();
        assert!(reset.is_disconnect());

        let eof: ProcessError = FrameError::Io(io::ErrorKind::UnexpectedEof.into()).into();
        assert!(eof.is_disconnect());

        let violation: ProcessError = FrameError::LengthViolation {
            requested: 2,
            remaining: 1,
        }
        .into();
        assert!(!violation.is_disconnect());
        assert!(matches!(violation, ProcessError::Frame(_)));

        assert!(!ProcessError::Protocol("bad opcode".into()).is_disconnect());
    }
}
