//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track active connections for graceful shutdown
//! - Count connection outcomes and completed exchanges

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// How a connection's handling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Peer finished sending (end-of-data).
    Completed,
    /// Peer went away mid-exchange.
    Disconnected,
    /// Processor failed or panicked.
    Failed,
}

impl ConnectionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionOutcome::Completed => "completed",
            ConnectionOutcome::Disconnected => "disconnected",
            ConnectionOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    active: AtomicU64,
    accepted: AtomicU64,
    completed: AtomicU64,
    disconnected: AtomicU64,
    failed: AtomicU64,
    exchanges: AtomicU64,
}

/// Tracks connections for graceful shutdown and diagnostics.
///
/// Cheap to clone; all clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counters: Arc<Counters>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.counters.accepted.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_connection_opened(active);
        ConnectionGuard {
            counters: Arc::clone(&self.counters),
            id: ConnectionId::new(),
            outcome: ConnectionOutcome::Completed,
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Connections accepted since the tracker was created.
    pub fn accepted(&self) -> u64 {
        self.counters.accepted.load(Ordering::SeqCst)
    }

    /// Connections that ended with end-of-data.
    pub fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::SeqCst)
    }

    pub fn disconnected(&self) -> u64 {
        self.counters.disconnected.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::SeqCst)
    }

    /// Request/response exchanges completed across all connections.
    pub fn exchanges(&self) -> u64 {
        self.counters.exchanges.load(Ordering::SeqCst)
    }

    /// Wait until all connections are closed or `timeout` elapses.
    ///
    /// Returns `true` if the tracker went idle in time.
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        let idle = async {
            while self.active_count() > 0 {
                // Check periodically
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(timeout, idle).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
/// Records the outcome and decrements the active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    counters: Arc<Counters>,
    id: ConnectionId,
    outcome: ConnectionOutcome,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn record_exchange(&self) {
        self.counters.exchanges.fetch_add(1, Ordering::SeqCst);
        metrics::record_exchange();
    }

    /// Set the outcome reported when the guard drops.
    pub fn set_outcome(&mut self, outcome: ConnectionOutcome) {
        self.outcome = outcome;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let counter = match self.outcome {
            ConnectionOutcome::Completed => &self.counters.completed,
            ConnectionOutcome::Disconnected => &self.counters.disconnected,
            ConnectionOutcome::Failed => &self.counters.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_connection_closed(self.outcome.as_str(), active);
        tracing::trace!(connection_id = %self.id, outcome = self.outcome.as_str(), "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let mut guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        guard2.record_exchange();
        guard2.set_outcome(ConnectionOutcome::Failed);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.accepted(), 2);
        assert_eq!(tracker.completed(), 1);
        assert_eq!(tracker.failed(), 1);
        assert_eq!(tracker.disconnected(), 0);
        assert_eq!(tracker.exchanges(), 1);
    }

    #[tokio::test]
    async fn wait_for_idle_times_out_while_active() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        assert!(!tracker.wait_for_idle(Duration::from_millis(50)).await);
        drop(guard);
        assert!(tracker.wait_for_idle(Duration::from_millis(50)).await);
    }
}
