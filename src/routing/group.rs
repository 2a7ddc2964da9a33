//! Route groups sharing a middleware stack.

use axum::http::Method;

use crate::error::PipelineError;
use crate::handler::{Chain, HandlerLike, MiddlewareHandler};

/// A set of routes built apart from a server and merged with `Server::mount`.
///
/// Group middleware ends up outside each route's own middleware.
#[derive(Debug, Default)]
pub struct Group {
    middleware: Vec<MiddlewareHandler>,
    routes: Vec<(Method, String, Chain)>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append middleware applied to every route of the group, including
    /// routes added before this call.
    pub fn use_middleware(&mut self, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        let normalized = handlers
            .into_iter()
            .map(HandlerLike::into_middleware)
            .collect::<Result<Vec<_>, _>>()?;
        self.middleware.extend(normalized);
        Ok(self)
    }

    /// Register a chain. An empty chain is ignored.
    pub fn route(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handlers: Vec<HandlerLike>,
    ) -> Result<&mut Self, PipelineError> {
        if handlers.is_empty() {
            return Ok(self);
        }
        let chain = Chain::normalize(handlers)?;
        self.routes.push((method, path.into(), chain));
        Ok(self)
    }

    pub fn get(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::GET, path, handlers)
    }

    pub fn post(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::POST, path, handlers)
    }

    pub fn put(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::PUT, path, handlers)
    }

    pub fn patch(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::PATCH, path, handlers)
    }

    pub fn delete(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::DELETE, path, handlers)
    }

    pub fn head(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::HEAD, path, handlers)
    }

    pub fn options(&mut self, path: impl Into<String>, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::OPTIONS, path, handlers)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes with group middleware applied, ready to compose.
    pub(crate) fn into_routes(self) -> impl Iterator<Item = (Method, String, Chain)> {
        let Group { middleware, routes } = self;
        routes
            .into_iter()
            .map(move |(method, path, chain)| (method, path, chain.wrapped_in(&middleware)))
    }
}
