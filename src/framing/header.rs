//! Frame header encoding.
//!
//! Every frame on the wire is an 8-byte header followed by the payload:
//!
//! ```text
//! +----------------+----------------+-------------------+
//! | seq (u32 BE)   | length (u32 BE)| payload (length)  |
//! +----------------+----------------+-------------------+
//! ```

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::framing::error::FrameError;

/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 8;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Request sequence number, echoed back in the reply.
    pub seq: u32,
    /// Payload length in bytes.
    pub length: u32,
}

impl FrameHeader {
    pub fn new(seq: u32, length: u32) -> Self {
        Self { seq, length }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.seq.to_be_bytes());
        out[4..].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    pub fn decode(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            seq: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Reject headers that declare more than `max` payload bytes.
    pub fn check_length(&self, max: u64) -> Result<(), FrameError> {
        let length = u64::from(self.length);
        if length > max {
            return Err(FrameError::TooLarge { length, max });
        }
        Ok(())
    }
}

/// Read the next frame header.
///
/// Returns `Ok(None)` when the stream ends cleanly before the first header
/// byte, and `UnexpectedEof` when it ends inside the header.
pub async fn read_header<R>(reader: &mut R) -> Result<Option<FrameHeader>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = [0u8; HEADER_LEN];
    if reader.read(&mut bytes[..1]).await? == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut bytes[1..]).await?;
    Ok(Some(FrameHeader::decode(bytes)))
}

/// Write a complete frame. Does not flush.
pub async fn write_frame<W>(writer: &mut W, seq: u32, payload: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let length = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "payload exceeds u32::MAX bytes"))?;
    writer.write_all(&FrameHeader::new(seq, length).encode()).await?;
    writer.write_all(payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_big_endian() {
        let header = FrameHeader::new(0x0102_0304, 5);
        assert_eq!(header.encode(), [1, 2, 3, 4, 0, 0, 0, 5]);
        assert_eq!(FrameHeader::decode(header.encode()), header);
    }

    #[test]
    fn oversized_header_rejected() {
        let header = FrameHeader::new(1, 1025);
        assert!(header.check_length(1025).is_ok());
        assert!(matches!(
            header.check_length(1024),
            Err(FrameError::TooLarge { length: 1025, max: 1024 })
        ));
    }

    #[tokio::test]
    async fn clean_eof_yields_none() {
        let mut empty: &[u8] = &[];
        assert!(read_header(&mut empty).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_inside_header_is_an_error() {
        let mut partial: &[u8] = &[0, 0, 0];
        let err = read_header(&mut partial).await.unwrap_err();
        match err {
            FrameError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn frame_written_then_read() {
        let mut wire = Vec::new();
        write_frame(&mut wire, 7, b"hello").await.unwrap();
        assert_eq!(wire.len(), HEADER_LEN + 5);

        let mut slice = wire.as_slice();
        let header = read_header(&mut slice).await.unwrap().unwrap();
        assert_eq!(header, FrameHeader::new(7, 5));
        assert_eq!(slice, b"hello");
    }
}
