//! Minimal client for framewire servers.
//!
//! Speaks the 8-byte header framing (`seq: u32`, `length: u32`, big-endian)
//! over any async byte stream.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

const HEADER_LEN: usize = 8;

/// A framed request/response client.
pub struct FrameClient<S> {
    stream: S,
    next_seq: u32,
}

impl FrameClient<TcpStream> {
    /// Connect over TCP.
    pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> FrameClient<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, next_seq: 1 }
    }

    /// Send one request frame and wait for its reply payload.
    pub async fn call(&mut self, payload: &[u8]) -> io::Result<Vec<u8>> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.send_raw(&encode_frame(seq, payload)?).await?;

        let (reply_seq, reply) = self.read_reply().await?;
        if reply_seq != seq {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("reply sequence {} does not match request {}", reply_seq, seq),
            ));
        }
        Ok(reply)
    }

    /// Write raw bytes, framed or not. Useful for sending partial frames.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    /// Read one reply frame, returning its sequence number and payload.
    pub async fn read_reply(&mut self) -> io::Result<(u32, Vec<u8>)> {
        let mut header = [0u8; HEADER_LEN];
        self.stream.read_exact(&mut header).await?;
        let seq = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        // Grows with the bytes received, not with the declared length.
        let mut payload = Vec::new();
        (&mut self.stream).take(u64::from(length)).read_to_end(&mut payload).await?;
        if payload.len() < length as usize {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok((seq, payload))
    }

    /// Close the write side, signalling end-of-data to the server.
    pub async fn finish(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Encode a complete frame.
pub fn encode_frame(seq: u32, payload: &[u8]) -> io::Result<Vec<u8>> {
    let length = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "payload exceeds u32::MAX bytes"))?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&seq.to_be_bytes());
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_encoding() {
        let frame = encode_frame(2, b"hi").unwrap();
        assert_eq!(frame, vec![0, 0, 0, 2, 0, 0, 0, 2, b'h', b'i']);
    }

    #[tokio::test]
    async fn call_matches_reply() {
        let (client_side, mut server_side) = tokio::io::duplex(256);
        let mut client = FrameClient::new(client_side);

        let server = tokio::spawn(async move {
            let mut request = [0u8; HEADER_LEN + 3];
            server_side.read_exact(&mut request).await.unwrap();
            server_side.write_all(&request).await.unwrap();
        });

        assert_eq!(client.call(b"abc").await.unwrap(), b"abc");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn truncated_reply_is_eof() {
        let (client_side, mut server_side) = tokio::io::duplex(256);
        let mut client = FrameClient::new(client_side);

        let mut reply = vec![0, 0, 0, 1, 0xFF, 0xFF, 0xFF, 0xFF];
        reply.extend_from_slice(b"short");
        server_side.write_all(&reply).await.unwrap();
        drop(server_side);

        let err = client.read_reply().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
