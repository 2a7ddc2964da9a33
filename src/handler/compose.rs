//! Folding middleware around a terminal handler.

use crate::error::PipelineError;
use crate::handler::shape::HandlerLike;
use crate::handler::types::{MiddlewareHandler, RequestHandler};

/// A normalized chain that has not been folded yet.
#[derive(Clone, Debug)]
pub struct Chain {
    middleware: Vec<MiddlewareHandler>,
    terminal: RequestHandler,
}

impl Chain {
    /// Normalize `handlers`: the last element is the terminal handler,
    /// everything before it is middleware.
    pub fn normalize(handlers: Vec<HandlerLike>) -> Result<Self, PipelineError> {
        let mut handlers = handlers;
        let terminal = handlers
            .pop()
            .ok_or(PipelineError::MissingTerminal)?
            .into_request_handler()?;

        let middleware = handlers
            .into_iter()
            .map(HandlerLike::into_middleware)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            middleware,
            terminal,
        })
    }

    /// Put `outer` around the existing middleware, outermost first.
    pub fn wrapped_in(mut self, outer: &[MiddlewareHandler]) -> Self {
        let mut middleware = outer.to_vec();
        middleware.append(&mut self.middleware);
        self.middleware = middleware;
        self
    }

    /// Number of handlers, terminal included.
    pub(crate) fn len(&self) -> usize {
        self.middleware.len() + 1
    }

    /// Build the single executable handler.
    pub fn compose(&self) -> RequestHandler {
        fold(&self.middleware, self.terminal.clone())
    }
}

/// Normalize and fold in one step.
pub fn compose(handlers: Vec<HandlerLike>) -> Result<RequestHandler, PipelineError> {
    Ok(Chain::normalize(handlers)?.compose())
}

/// Wrap `terminal` so that `middleware[0]` ends up outermost.
pub fn fold(middleware: &[MiddlewareHandler], terminal: RequestHandler) -> RequestHandler {
    middleware
        .iter()
        .rev()
        .fold(terminal, |next, m| m.wrap(next))
}
