//! Per-connection tracing spans.

use tracing::Span;

use crate::net::ConnectionId;

/// Span wrapping everything logged while handling one connection.
pub fn connection_span(id: ConnectionId, peer: &str) -> Span {
    tracing::info_span!("connection", id = %id, peer = %peer)
}
