//! Route table and the terminal dispatcher built from it.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use crate::context::Context;
use crate::error::PipelineError;
use crate::handler::RequestHandler;
use crate::routing::router::{Lookup, MatchitRouter, PathRouter};

/// A registered (method, path) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

/// Every route of a server, keyed by method and path.
pub struct RouteTable {
    router: Box<dyn PathRouter>,
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::with_router(MatchitRouter::new())
    }

    /// Use a different path router implementation.
    pub fn with_router(router: impl PathRouter + 'static) -> Self {
        Self {
            router: Box::new(router),
            routes: Vec::new(),
        }
    }

    /// Register an already composed handler.
    pub fn insert(&mut self, method: Method, path: &str, handler: RequestHandler) -> Result<(), PipelineError> {
        self.router.insert(method.clone(), path, handler)?;
        self.routes.push(Route {
            method,
            path: path.to_string(),
        });
        Ok(())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freeze the table into the innermost handler of the global chain.
    ///
    /// Unknown paths get a plain 404 and a successful result, so no request
    /// error is raised for them.
    pub fn into_dispatcher(self) -> RequestHandler {
        let table = Arc::new(self);
        RequestHandler::new(move |ctx| table.dispatch(ctx))
    }

    fn dispatch(&self, ctx: &mut Context) -> Result<(), crate::http::HttpError> {
        let lookup = {
            let request = ctx.request()?;
            self.router.lookup(request.method(), request.uri().path())
        };

        match lookup {
            Lookup::Found { handler, params } => {
                ctx.exchange_mut()?.set_params(params);
                handler.call(ctx)
            }
            Lookup::MethodNotAllowed(methods) => {
                let allow = methods
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let response = ctx.exchange_mut()?.response_mut();
                *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                *response.body_mut() = Bytes::from_static(b"Method Not Allowed");
                Ok(())
            }
            Lookup::NotFound => {
                let response = ctx.exchange_mut()?.response_mut();
                *response.status_mut() = StatusCode::NOT_FOUND;
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                *response.body_mut() = Bytes::from_static(b"Not Found");
                Ok(())
            }
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable").field("routes", &self.routes).finish()
    }
}
