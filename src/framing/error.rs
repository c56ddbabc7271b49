//! Framing error types.

use std::io;
use thiserror::Error;

/// Errors raised while reading framed data.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The caller asked for more bytes than the frame has left.
    #[error("requested {requested} bytes but only {remaining} remain in frame")]
    LengthViolation { requested: u64, remaining: u64 },

    /// A header declared a payload larger than the configured maximum.
    #[error("frame of {length} bytes exceeds maximum of {max} bytes")]
    TooLarge { length: u64, max: u64 },

    /// Failure in the underlying byte source.
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_converts_to_invalid_input() {
        let err: io::Error = FrameError::LengthViolation {
            requested: 8,
            remaining: 2,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("only 2 remain"));
    }

    #[test]
    fn io_error_passes_through() {
        let err: io::Error = FrameError::Io(io::ErrorKind::BrokenPipe.into()).into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
