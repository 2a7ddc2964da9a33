//! Strata: composable request pipelines over a pooled per-request context.
//!
//! Handlers come in several shapes (plain handlers, middleware, explicit
//! continuations, raw exchange handlers, foreign `tower` services). Each
//! chain is normalized and folded into one handler at registration time;
//! at request time a pooled [`Context`] is attached to the exchange and the
//! composed handler runs.

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use context::{Context, Exchange, Link};
pub use error::{PipelineError, Position};
pub use handler::{
    compose, continuation, handler, middleware, raw, service, HandlerLike, HandlerRegistry,
    MiddlewareHandler, RequestHandler,
};
pub use http::{HttpError, Pipeline, Server};
pub use lifecycle::Shutdown;
pub use routing::Group;
