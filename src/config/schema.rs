//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::server::HandlingStrategy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Connection handling settings.
    pub server: ServerConfig,

    /// Frame limits.
    pub framing: FramingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:17017").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:17017".to_string(),
            max_connections: 1024,
        }
    }
}

/// Connection handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Serial or concurrent connection handling.
    pub strategy: HandlingStrategy,

    /// How long to wait for open connections after shutdown, in seconds.
    pub drain_timeout_secs: u64,

    /// Per-connection read buffer capacity in bytes.
    pub read_buffer_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            strategy: HandlingStrategy::Concurrent,
            drain_timeout_secs: 10,
            read_buffer_bytes: 8 * 1024,
        }
    }
}

/// Framing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Largest payload a frame header may declare, in bytes.
    pub max_frame_len: u64,

    /// Skip unread payload bytes when a frame is closed.
    pub drain_on_close: bool,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_frame_len: 16 * 1024 * 1024, // 16MB
            drain_on_close: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
