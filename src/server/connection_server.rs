//! Accept loop.
//!
//! # State Machine
//! ```text
//! Idle → Accepting → Handling(conn) → Accepting → ...
//! ```
//! The only way out of the loop is an acceptor failure (or the shutdown
//! signal given to [`ConnectionServer::serve_until`]).

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::net::connection::ConnectionTracker;
use crate::net::listener::ListenerError;
use crate::net::transport::Acceptor;
use crate::server::handler::{handle_connection, HandlingStrategy};
use crate::server::processor::Processor;

/// Default capacity of each connection's read buffer.
pub const DEFAULT_READ_BUFFER: usize = 8 * 1024;

/// Fatal server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The acceptor can no longer produce connections.
    #[error("accept failed: {0}")]
    Accept(#[from] ListenerError),
}

/// Accepts connections and drives a shared processor over each one.
pub struct ConnectionServer<P, A> {
    processor: Arc<P>,
    acceptor: A,
    strategy: HandlingStrategy,
    tracker: ConnectionTracker,
    read_buffer: usize,
}

impl<P, A> ConnectionServer<P, A>
where
    P: Processor,
    A: Acceptor,
{
    /// Create a server with the given handling strategy.
    pub fn new(processor: P, acceptor: A, strategy: HandlingStrategy) -> Self {
        Self::with_shared_processor(Arc::new(processor), acceptor, strategy)
    }

    /// Create a server around a processor the caller also holds.
    pub fn with_shared_processor(processor: Arc<P>, acceptor: A, strategy: HandlingStrategy) -> Self {
        Self {
            processor,
            acceptor,
            strategy,
            tracker: ConnectionTracker::new(),
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }

    /// Serial server: one connection at a time.
    pub fn serial(processor: P, acceptor: A) -> Self {
        Self::new(processor, acceptor, HandlingStrategy::Serial)
    }

    /// Concurrent server: one task per connection.
    pub fn concurrent(processor: P, acceptor: A) -> Self {
        Self::new(processor, acceptor, HandlingStrategy::Concurrent)
    }

    /// Set the per-connection read buffer capacity.
    pub fn with_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer = bytes.max(1);
        self
    }

    /// Get a handle on this server's connection counters.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    pub fn strategy(&self) -> HandlingStrategy {
        self.strategy
    }

    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }

    pub fn acceptor(&self) -> &A {
        &self.acceptor
    }

    /// Run the accept loop forever.
    ///
    /// Returns only when the acceptor fails. Connection-level failures are
    /// logged and never end the loop.
    pub async fn serve(&mut self) -> Result<(), ServerError> {
        self.serve_until(std::future::pending()).await
    }

    /// Run the accept loop until `shutdown` resolves.
    ///
    /// Shutdown stops accepting; concurrent connections already running
    /// keep going (see [`ConnectionTracker::wait_for_idle`]). A serial
    /// server notices shutdown only between connections.
    pub async fn serve_until<F>(&mut self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(strategy = %self.strategy, "Connection server starting");
        tokio::pin!(shutdown);

        loop {
            let transport = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!(
                        active_connections = self.tracker.active_count(),
                        "Connection server stopping"
                    );
                    return Ok(());
                }
                accepted = self.acceptor.accept() => match accepted {
                    Ok(transport) => transport,
                    Err(e) => {
                        tracing::error!(error = %e, "Acceptor failed, stopping server");
                        return Err(ServerError::Accept(e));
                    }
                },
            };

            let guard = self.tracker.track();
            let processor = Arc::clone(&self.processor);
            match self.strategy {
                HandlingStrategy::Serial => {
                    handle_connection(processor, transport, guard, self.read_buffer).await;
                }
                HandlingStrategy::Concurrent => {
                    tokio::spawn(handle_connection(processor, transport, guard, self.read_buffer));
                }
            }
        }
    }
}
