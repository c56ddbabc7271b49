//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics when enabled
//! - Bind the TCP acceptor
//! - Build the echo server from configuration
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Acceptor binds last (traffic only when ready)

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::net::{ListenerError, TcpAcceptor};
use crate::observability::metrics;
use crate::server::{ConnectionServer, EchoProcessor};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Bring up the echo server described by `config`.
pub async fn start(config: &ServiceConfig) -> Result<ConnectionServer<EchoProcessor, TcpAcceptor>, StartupError> {
    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let acceptor = TcpAcceptor::bind(&config.listener).await?;
    let processor = EchoProcessor::from_config(&config.framing);

    Ok(ConnectionServer::new(processor, acceptor, config.server.strategy)
        .with_read_buffer(config.server.read_buffer_bytes))
}
