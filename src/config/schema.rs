//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Identity of the server.
    pub server: IdentityConfig,

    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Per-connection transport options.
    pub transport: TransportConfig,

    /// Context pool sizing.
    pub pool: PoolConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Names of global middleware, outermost first.
    pub middleware: Vec<String>,

    /// Route definitions resolved through a handler registry.
    pub routes: Vec<RouteConfig>,
}

/// Server identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Sent in the `Server` response header and used as the logger name.
    pub name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "strata".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Transport options applied to every connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Close each connection after one response.
    pub disable_keepalive: bool,

    /// Deadline for reading request headers, in seconds.
    pub read_timeout_secs: u64,

    /// Deadline for the whole request, in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted request body, in bytes.
    pub max_request_body_size: usize,

    /// Reject every method other than GET before the pipeline runs.
    pub get_only: bool,

    /// How long in-flight connections may drain after shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            disable_keepalive: false,
            read_timeout_secs: 30,
            request_timeout_secs: 30,
            max_request_body_size: 4 * 1024 * 1024,
            get_only: false,
            shutdown_grace_secs: 10,
        }
    }
}

/// Context pool sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle contexts kept for reuse; extra ones are dropped on release.
    pub max_idle: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_idle: 1024 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One route assembled from registered handler names.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// HTTP method (e.g., "GET").
    pub method: String,

    /// Path pattern (e.g., "/users/{id}").
    pub path: String,

    /// Handler names; the last one is the terminal handler.
    #[serde(default)]
    pub handlers: Vec<String>,
}
