//! Length-bounded view over a byte source.
//!
//! A [`BoundedReader`] is created per frame once the frame's length is known.
//! It refuses any read that would cross the frame boundary and, on close,
//! can skip whatever the caller left unread so the underlying stream is
//! positioned at the start of the next frame.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::framing::error::FrameError;

const READ_CHUNK: usize = 4 * 1024;

/// Reader limited to a declared frame length.
///
/// `remaining` only ever decreases, and only by the number of bytes actually
/// read or skipped. After [`close`](Self::close) every read reports
/// end-of-data.
#[derive(Debug)]
pub struct BoundedReader<R> {
    /// Underlying source; `None` once closed.
    inner: Option<R>,
    remaining: u64,
    drain_on_close: bool,
    close_underlying: bool,
}

impl<R> BoundedReader<R> {
    /// Wrap `inner`, allowing at most `length` bytes to be consumed.
    ///
    /// With `drain_on_close`, closing skips unread bytes of the frame. With
    /// `close_underlying`, closing drops `inner` instead of handing it back.
    pub fn new(inner: R, length: u64, drain_on_close: bool, close_underlying: bool) -> Self {
        Self {
            inner: Some(inner),
            remaining: length,
            drain_on_close,
            close_underlying,
        }
    }

    /// Bytes left in the frame.
    pub fn available(&self) -> u64 {
        self.remaining
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<R: AsyncRead + Unpin> BoundedReader<R> {
    /// Read up to `buf.len()` bytes.
    ///
    /// Fails with [`FrameError::LengthViolation`] when `buf` is longer than
    /// the bytes left in the frame. May return fewer bytes than requested,
    /// including zero when the underlying source is exhausted.
    pub async fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };
        let requested = buf.len() as u64;
        if requested > self.remaining {
            return Err(FrameError::LengthViolation {
                requested,
                remaining: self.remaining,
            });
        }
        if requested == 0 {
            return Ok(0);
        }

        let n = inner.read(buf).await?;
        self.remaining -= n as u64;
        Ok(n)
    }

    /// Read a single byte, or `None` at end-of-data.
    pub async fn read_one(&mut self) -> Result<Option<u8>, FrameError> {
        let mut byte = [0u8; 1];
        match self.read_into(&mut byte).await? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Fill `buf` completely or fail with `UnexpectedEof`.
    ///
    /// Unlike the other reads, a closed reader is not end-of-data here: it
    /// can never fill a non-empty `buf`, so that is `UnexpectedEof` too.
    pub async fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), FrameError> {
        let requested = buf.len() as u64;
        if !self.is_closed() && requested > self.remaining {
            return Err(FrameError::LengthViolation {
                requested,
                remaining: self.remaining,
            });
        }

        let mut filled = 0;
        while filled < buf.len() {
            match self.read_into(&mut buf[filled..]).await? {
                0 => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
                n => filled += n,
            }
        }
        Ok(())
    }

    /// Append the rest of the frame to `out`, returning the number of bytes
    /// read.
    ///
    /// `out` grows as bytes arrive rather than up front, so a frame header
    /// declaring a huge length costs nothing until the payload shows up.
    /// Fails with `UnexpectedEof` if the source ends before the frame does.
    pub async fn read_remaining(&mut self, out: &mut Vec<u8>) -> Result<usize, FrameError> {
        if self.is_closed() {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let mut total = 0;
        while self.remaining > 0 {
            let want = self.remaining.min(READ_CHUNK as u64) as usize;
            match self.read_into(&mut chunk[..want]).await? {
                0 => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
                n => {
                    out.extend_from_slice(&chunk[..n]);
                    total += n;
                }
            }
        }
        Ok(total)
    }

    /// Skip up to `n` bytes, clamped to what is left in the frame.
    ///
    /// Returns the number of bytes actually skipped, which is smaller than
    /// requested only if the underlying source ends first.
    pub async fn skip(&mut self, n: u64) -> Result<u64, FrameError> {
        let n = n.min(self.remaining);
        if n == 0 {
            return Ok(0);
        }
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };

        let mut limited = (&mut *inner).take(n);
        let skipped = tokio::io::copy(&mut limited, &mut tokio::io::sink()).await?;
        self.remaining -= skipped;
        Ok(skipped)
    }

    /// Skip everything left in the frame.
    pub async fn skip_remaining(&mut self) -> Result<u64, FrameError> {
        self.skip(self.remaining).await
    }

    /// Close the reader.
    ///
    /// The first call drains the frame (if configured) and detaches the
    /// underlying source, returning it unless `close_underlying` was set.
    /// Later calls do nothing and return `Ok(None)`. The reader is closed
    /// even when draining fails.
    pub async fn close(&mut self) -> Result<Option<R>, FrameError> {
        if self.inner.is_none() {
            return Ok(None);
        }

        let drained = if self.drain_on_close {
            self.skip_remaining().await.map(|_| ())
        } else {
            Ok(())
        };

        let inner = self.inner.take();
        drained?;

        if self.close_underlying {
            drop(inner);
            Ok(None)
        } else {
            Ok(inner)
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for BoundedReader<R> {
    /// Behaves like [`tokio::io::Take`]: the read is capped at the bytes left
    /// in the frame and an exhausted frame reports end-of-data, so `copy`,
    /// `read_to_end` and `BufReader` work over a frame. The strict request
    /// check lives in [`read_into`](Self::read_into).
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        if this.remaining == 0 || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        let max = usize::try_from(this.remaining)
            .unwrap_or(usize::MAX)
            .min(buf.remaining());
        let n = {
            let mut limited = ReadBuf::new(buf.initialize_unfilled_to(max));
            ready!(Pin::new(inner).poll_read(cx, &mut limited))?;
            limited.filled().len()
        };
        buf.advance(n);
        this.remaining -= n as u64;
        Poll::Ready(Ok(()))
    }
}

impl<R> Drop for BoundedReader<R> {
    fn drop(&mut self) {
        if self.inner.is_some() && self.drain_on_close && self.remaining > 0 {
            tracing::warn!(
                remaining = self.remaining,
                "Bounded reader dropped without close, stream alignment lost"
            );
        }
    }
}
