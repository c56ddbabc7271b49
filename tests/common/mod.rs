//! Shared utilities for integration tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use framewire::net::ConnectionTracker;
use framewire::{ChannelAcceptor, ConnectionServer, HandlingStrategy, Processor, ServerError};
use framewire_client::FrameClient;
use tokio::io::DuplexStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// A server running on in-memory transports.
#[allow(dead_code)]
pub struct TestServer {
    pub connector: mpsc::Sender<DuplexStream>,
    pub tracker: ConnectionTracker,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Start `processor` behind a channel acceptor.
    pub fn start<P: Processor>(processor: P, strategy: HandlingStrategy) -> Self {
        let (connector, acceptor) = ChannelAcceptor::new(16);
        let mut server = ConnectionServer::new(processor, acceptor, strategy);
        let tracker = server.tracker();
        let handle = tokio::spawn(async move { server.serve().await });
        Self {
            connector,
            tracker,
            handle,
        }
    }

    /// Open a new connection to the server.
    pub async fn connect(&self) -> FrameClient<DuplexStream> {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        self.connector
            .send(server_side)
            .await
            .expect("server stopped accepting");
        FrameClient::new(client_side)
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Run `fut`, failing the test if it takes longer than two seconds.
#[allow(dead_code)]
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("operation timed out")
}

/// Counts `ERROR` events emitted on the current thread.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct ErrorEvents(Arc<AtomicUsize>);

#[allow(dead_code)]
impl ErrorEvents {
    /// Install a thread-local subscriber that records errors until the guard
    /// is dropped. Tasks of a current-thread runtime are included.
    pub fn capture() -> (Self, DefaultGuard) {
        let events = Self::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (events, guard)
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
