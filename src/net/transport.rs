//! Transport and acceptor abstractions.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::sync::mpsc;

use crate::net::listener::ListenerError;

/// A connection's bidirectional byte channel.
///
/// The server splits [`stream`](Transport::stream) into a readable and a
/// writable half for the processor. Dropping the transport closes it.
pub trait Transport: Send + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Human-readable peer description for logs.
    fn peer(&self) -> String;

    fn stream(&mut self) -> &mut Self::Stream;
}

/// Source of incoming transports.
pub trait Acceptor: Send {
    type Transport: Transport;

    /// Wait for the next connection.
    ///
    /// An error here is fatal to the server using this acceptor.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Transport, ListenerError>> + Send;
}

impl Transport for DuplexStream {
    type Stream = DuplexStream;

    fn peer(&self) -> String {
        "duplex".to_string()
    }

    fn stream(&mut self) -> &mut Self::Stream {
        self
    }
}

/// Acceptor fed by an in-process channel.
///
/// Lets an embedding application (or a test) hand transports it created
/// itself to a server. Accepting fails with [`ListenerError::Closed`] once
/// every sender is gone.
#[derive(Debug)]
pub struct ChannelAcceptor<T> {
    rx: mpsc::Receiver<T>,
}

impl<T: Transport> ChannelAcceptor<T> {
    /// Create an acceptor and the sender that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

impl<T: Transport> Acceptor for ChannelAcceptor<T> {
    type Transport = T;

    async fn accept(&mut self) -> Result<T, ListenerError> {
        self.rx.recv().await.ok_or(ListenerError::Closed)
    }
}
