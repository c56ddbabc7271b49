//! Echo processor.
//!
//! Replies to every frame with a frame carrying the same sequence number
//! and payload. Serves as the reference processor for the binary and the
//! integration tests.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::FramingConfig;
use crate::framing::{read_header, write_frame, BoundedReader};
use crate::server::processor::{Exchange, ProcessError, Processor};

#[derive(Debug, Clone)]
pub struct EchoProcessor {
    max_frame_len: u64,
    drain_on_close: bool,
}

impl EchoProcessor {
    pub fn new(max_frame_len: u64) -> Self {
        Self {
            max_frame_len,
            drain_on_close: true,
        }
    }

    pub fn from_config(config: &FramingConfig) -> Self {
        Self {
            max_frame_len: config.max_frame_len,
            drain_on_close: config.drain_on_close,
        }
    }
}

impl Default for EchoProcessor {
    fn default() -> Self {
        Self::from_config(&FramingConfig::default())
    }
}

impl Processor for EchoProcessor {
    async fn process<R, W>(&self, input: &mut R, output: &mut W) -> Result<Exchange, ProcessError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let Some(header) = read_header(input).await? else {
            return Ok(Exchange::EndOfData);
        };
        header.check_length(self.max_frame_len)?;

        let mut frame = BoundedReader::new(&mut *input, u64::from(header.length), self.drain_on_close, false);
        let mut payload = Vec::new();
        frame.read_remaining(&mut payload).await?;
        frame.close().await?;

        tracing::trace!(seq = header.seq, length = header.length, "Echoing frame");
        write_frame(output, header.seq, &payload).await?;
        Ok(Exchange::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{FrameError, FrameHeader};

    #[tokio::test]
    async fn echoes_frames_until_end_of_data() {
        let mut wire = Vec::new();
        write_frame(&mut wire, 1, b"hello").await.unwrap();
        write_frame(&mut wire, 2, b"").await.unwrap();

        let processor = EchoProcessor::new(1024);
        let mut input = wire.as_slice();
        let mut output = Vec::new();

        assert_eq!(processor.process(&mut input, &mut output).await.unwrap(), Exchange::Completed);
        assert_eq!(processor.process(&mut input, &mut output).await.unwrap(), Exchange::Completed);
        assert_eq!(processor.process(&mut input, &mut output).await.unwrap(), Exchange::EndOfData);
        assert_eq!(output, wire);
    }

    #[tokio::test]
    async fn oversized_frame_rejected() {
        let mut input: &[u8] = &FrameHeader::new(9, 2048).encode();
        let mut output = Vec::new();
        let err = EchoProcessor::new(1024)
            .process(&mut input, &mut output)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Frame(FrameError::TooLarge { .. })));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn truncated_payload_is_a_disconnect() {
        let mut wire = FrameHeader::new(1, 10).encode().to_vec();
        wire.extend_from_slice(b"abc");
        let mut input = wire.as_slice();
        let mut output = Vec::new();
        let err = EchoProcessor::new(1024)
            .process(&mut input, &mut output)
            .await
            .unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn huge_declared_length_with_short_payload() {
        let mut wire = FrameHeader::new(3, u32::MAX).encode().to_vec();
        wire.extend_from_slice(b"tiny");
        let mut input = wire.as_slice();
        let mut output = Vec::new();
        let err = EchoProcessor::new(u64::from(u32::MAX))
            .process(&mut input, &mut output)
            .await
            .unwrap_err();
        assert!(err.is_disconnect());
        assert!(output.is_empty());
    }
}
