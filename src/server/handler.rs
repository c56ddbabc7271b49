//! Per-connection handling.
//!
//! # Responsibilities
//! - Split a transport into buffered input and output halves
//! - Drive the processor until end-of-data or error
//! - Contain processor errors and panics at the connection boundary
//! - Record the connection outcome

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::Instrument;

use crate::net::connection::{ConnectionGuard, ConnectionOutcome};
use crate::net::Transport;
use crate::observability::tracing::connection_span;
use crate::server::processor::{Exchange, ProcessError, Processor};

/// How accepted connections are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlingStrategy {
    /// Handle each connection to completion on the accept loop before
    /// accepting the next one.
    Serial,
    /// Run each connection on its own task.
    #[default]
    Concurrent,
}

impl fmt::Display for HandlingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlingStrategy::Serial => write!(f, "serial"),
            HandlingStrategy::Concurrent => write!(f, "concurrent"),
        }
    }
}

impl FromStr for HandlingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(HandlingStrategy::Serial),
            "concurrent" => Ok(HandlingStrategy::Concurrent),
            other => Err(format!("unknown handling strategy '{}' (expected serial or concurrent)", other)),
        }
    }
}

/// Handle one connection until the peer is done or something fails.
///
/// Never returns an error: every failure is logged and recorded on `guard`.
/// The transport is dropped (closed) on return.
pub(crate) async fn handle_connection<P, T>(
    processor: Arc<P>,
    mut transport: T,
    mut guard: ConnectionGuard,
    read_buffer: usize,
) where
    P: Processor,
    T: Transport,
{
    let span = connection_span(guard.id(), &transport.peer());

    let outcome = async {
        tracing::debug!("Handling connection");
        let result = AssertUnwindSafe(run_exchanges(
            processor.as_ref(),
            transport.stream(),
            &guard,
            read_buffer,
        ))
        .catch_unwind()
        .await;
        classify(result)
    }
    .instrument(span)
    .await;

    guard.set_outcome(outcome);
}

async fn run_exchanges<P, S>(
    processor: &P,
    stream: &mut S,
    guard: &ConnectionGuard,
    read_buffer: usize,
) -> Result<u64, ProcessError>
where
    P: Processor,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut input = BufReader::with_capacity(read_buffer, reader);
    let mut output = BufWriter::new(writer);
    let mut exchanges = 0u64;

    let result = loop {
        match processor.process(&mut input, &mut output).await {
            Ok(Exchange::Completed) => {
                if let Err(e) = output.flush().await {
                    break Err(ProcessError::Io(e));
                }
                exchanges += 1;
                guard.record_exchange();
                tracing::trace!(exchanges, "Exchange completed");
            }
            Ok(Exchange::EndOfData) => break Ok(exchanges),
            Err(e) => break Err(e),
        }
    };

    // Flushes anything still buffered and signals EOF to the peer.
    if let Err(e) = output.shutdown().await {
        tracing::debug!(error = %e, "Failed to shut down connection output");
    }
    result
}

fn classify(result: Result<Result<u64, ProcessError>, Box<dyn Any + Send>>) -> ConnectionOutcome {
    match result {
        Ok(Ok(exchanges)) => {
            tracing::debug!(exchanges, "Connection closed by peer");
            ConnectionOutcome::Completed
        }
        Ok(Err(e)) if e.is_disconnect() => {
            tracing::warn!(error = %e, "Client disconnected mid-exchange");
            ConnectionOutcome::Disconnected
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Processor failed, closing connection");
            ConnectionOutcome::Failed
        }
        Err(panic) => {
            tracing::error!(panic = panic_message(panic.as_ref()), "Processor panicked, closing connection");
            ConnectionOutcome::Failed
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
