//! Read-only view of the owning server, shared by every context it lends out.

use axum::http::Extensions;

use crate::config::ServerConfig;

/// Process-wide facilities of a server, frozen at start.
#[derive(Debug, Default)]
pub struct ServerHandle {
    config: ServerConfig,
    /// Values registered with `Server::provide`, keyed by type.
    facilities: Extensions,
}

impl ServerHandle {
    pub(crate) fn new(config: ServerConfig, facilities: Extensions) -> Self {
        Self { config, facilities }
    }

    /// Server name as sent in the `Server` response header.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Look up a facility by type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.facilities.get::<T>()
    }
}
