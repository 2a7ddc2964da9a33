//! Configuration-time errors.
//!
//! Everything here is reported synchronously by a registration or start call.
//! Request-time failures use [`crate::http::HttpError`] instead.

use axum::http::Method;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::net::ListenerError;

/// Where a handler-like value was found when it failed to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The last element of a chain.
    Terminal,
    /// Any element before the last one.
    Middleware,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Terminal => f.write_str("terminal"),
            Position::Middleware => f.write_str("middleware"),
        }
    }
}

/// Error raised while configuring or starting a server.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A handler-like value cannot be used at the given chain position.
    #[error("unsupported handler shape: {shape} cannot be used in {position} position")]
    UnsupportedShape {
        shape: &'static str,
        position: Position,
    },

    /// A chain was composed without any element.
    #[error("handler chain has no terminal handler")]
    MissingTerminal,

    /// A registry lookup by name failed.
    #[error("no handler registered under the name `{0}`")]
    UnknownHandler(String),

    /// Middleware, routes or facilities were added after `start`.
    #[error("server is running: {0} cannot be changed after start")]
    Frozen(&'static str),

    /// `start` or `listen` was called twice.
    #[error("server is already running")]
    AlreadyRunning,

    /// The path router rejected a pattern.
    #[error("cannot register {method} {path}: {source}")]
    RouteConflict {
        method: Method,
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    /// A method name from configuration is not a valid HTTP method.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving the listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
