//! Server façade and the pipeline entry point.
//!
//! # Responsibilities
//! - Collect global middleware, routes and facilities while configuring
//! - Compose every route once, at registration
//! - Freeze everything into a [`Pipeline`] on start
//! - Serve each exchange: pooled context, composed handler, error translation
//! - Bind the transport (`listen`, `serve`)
//!
//! # Design Decisions
//! - Two states: Configuring and Running; every mutation after start fails
//! - Registration errors are returned, never panicked
//! - Handler panics are contained per request and reported as 500

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::{Extensions, Method, Response};
use bytes::Bytes;
use tokio::net::TcpListener;
use tracing::Span;

use crate::config::ServerConfig;
use crate::context::{ContextPool, Exchange, ServerHandle};
use crate::error::PipelineError;
use crate::handler::{fold, Chain, HandlerLike, HandlerRegistry, MiddlewareHandler, RequestHandler};
use crate::http::error::{translate_error, HttpError};
use crate::lifecycle::shutdown_signal;
use crate::net::{self, Listener};
use crate::observability::metrics;
use crate::routing::{Group, PathRouter, Route, RouteTable};

enum State {
    Configuring {
        middleware: Vec<MiddlewareHandler>,
        routes: RouteTable,
        facilities: Extensions,
    },
    Running(Arc<Pipeline>),
}

/// An HTTP server assembling handler chains into one pipeline.
pub struct Server {
    config: ServerConfig,
    logger: Span,
    state: State,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let logger = tracing::info_span!("server", name = %config.server.name);
        Self {
            config,
            logger,
            state: State::Configuring {
                middleware: Vec::new(),
                routes: RouteTable::new(),
                facilities: Extensions::new(),
            },
        }
    }

    /// Replace the logger handed to every context.
    pub fn with_logger(mut self, logger: Span) -> Self {
        self.logger = logger;
        self
    }

    /// Use a different path router. Only possible before any route is added.
    pub fn with_router(mut self, router: impl PathRouter + 'static) -> Result<Self, PipelineError> {
        match &mut self.state {
            State::Configuring { routes, .. } if routes.is_empty() => {
                *routes = RouteTable::with_router(router);
                Ok(self)
            }
            _ => Err(PipelineError::Frozen("router")),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Register a process-wide value, later readable through
    /// `Context::server().get::<T>()`.
    pub fn provide<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Result<&mut Self, PipelineError> {
        match &mut self.state {
            State::Configuring { facilities, .. } => {
                facilities.insert(value);
                Ok(self)
            }
            State::Running(_) => Err(PipelineError::Frozen("facilities")),
        }
    }

    /// Append global middleware. The first registered runs outermost.
    pub fn use_middleware(&mut self, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        let State::Configuring { middleware, .. } = &mut self.state else {
            return Err(PipelineError::Frozen("middleware"));
        };

        let normalized = handlers
            .into_iter()
            .map(HandlerLike::into_middleware)
            .collect::<Result<Vec<_>, _>>()?;
        let count = normalized.len();
        middleware.extend(normalized);
        tracing::debug!(parent: &self.logger, count, "Global middleware added");
        Ok(self)
    }

    /// Register a chain for `method` and `path`.
    ///
    /// The last element is the terminal handler. An empty chain registers
    /// nothing, so requests to the path stay 404.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<HandlerLike>,
    ) -> Result<&mut Self, PipelineError> {
        if matches!(self.state, State::Running(_)) {
            return Err(PipelineError::Frozen("routes"));
        }
        if handlers.is_empty() {
            tracing::debug!(parent: &self.logger, %method, path, "Empty chain ignored");
            return Ok(self);
        }
        let chain = Chain::normalize(handlers)?;
        self.insert(method, path, chain)
    }

    pub fn get(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::GET, path, handlers)
    }

    pub fn post(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::POST, path, handlers)
    }

    pub fn put(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::PUT, path, handlers)
    }

    pub fn patch(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::PATCH, path, handlers)
    }

    pub fn delete(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::DELETE, path, handlers)
    }

    pub fn head(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::HEAD, path, handlers)
    }

    pub fn options(&mut self, path: &str, handlers: Vec<HandlerLike>) -> Result<&mut Self, PipelineError> {
        self.route(Method::OPTIONS, path, handlers)
    }

    /// Merge a group. Group middleware wraps each of its routes.
    pub fn mount(&mut self, group: Group) -> Result<&mut Self, PipelineError> {
        if matches!(self.state, State::Running(_)) {
            return Err(PipelineError::Frozen("routes"));
        }
        for (method, path, chain) in group.into_routes() {
            self.insert(method, &path, chain)?;
        }
        Ok(self)
    }

    /// Register the global middleware and routes named in the configuration.
    pub fn load_routes(&mut self, registry: &HandlerRegistry) -> Result<&mut Self, PipelineError> {
        let middleware = registry.resolve(&self.config.middleware)?;
        let routes = self
            .config
            .routes
            .iter()
            .map(|route| {
                let method = Method::from_bytes(route.method.as_bytes())
                    .map_err(|_| PipelineError::InvalidMethod(route.method.clone()))?;
                Ok((method, route.path.clone(), registry.resolve(&route.handlers)?))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        self.use_middleware(middleware)?;
        for (method, path, handlers) in routes {
            self.route(method, &path, handlers)?;
        }
        Ok(self)
    }

    /// Registered (method, path) pairs in registration order.
    pub fn routes(&self) -> Vec<Route> {
        match &self.state {
            State::Configuring { routes, .. } => routes.routes().to_vec(),
            State::Running(pipeline) => pipeline.routes.clone(),
        }
    }

    fn insert(&mut self, method: Method, path: &str, chain: Chain) -> Result<&mut Self, PipelineError> {
        let State::Configuring { routes, .. } = &mut self.state else {
            return Err(PipelineError::Frozen("routes"));
        };
        routes.insert(method.clone(), path, chain.compose())?;
        tracing::debug!(parent: &self.logger, %method, path, handlers = chain.len(), "Route registered");
        Ok(self)
    }

    /// Freeze configuration and build the request entry point.
    pub fn start(&mut self) -> Result<Arc<Pipeline>, PipelineError> {
        let (middleware, routes, facilities) = match &mut self.state {
            State::Running(_) => return Err(PipelineError::AlreadyRunning),
            State::Configuring {
                middleware,
                routes,
                facilities,
            } => (
                std::mem::take(middleware),
                std::mem::take(routes),
                std::mem::take(facilities),
            ),
        };

        let route_list = routes.routes().to_vec();
        let entry = fold(&middleware, routes.into_dispatcher());
        let handle = Arc::new(ServerHandle::new(self.config.clone(), facilities));
        let pool = Arc::new(ContextPool::new(
            self.logger.clone(),
            Arc::clone(&handle),
            self.config.pool.max_idle,
        ));

        let pipeline = Arc::new(Pipeline {
            entry,
            pool,
            handle,
            logger: self.logger.clone(),
            routes: route_list,
        });
        self.state = State::Running(Arc::clone(&pipeline));

        tracing::info!(
            parent: &self.logger,
            routes = pipeline.routes.len(),
            middleware = middleware.len(),
            "Server started"
        );
        Ok(pipeline)
    }

    /// Start and serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&mut self, listener: TcpListener, shutdown: F) -> Result<(), PipelineError>
    where
        F: Future<Output = ()> + Send,
    {
        let pipeline = self.start()?;
        let listener = Listener::from_tcp(listener, self.config.listener.max_connections);
        net::serve(listener, pipeline, &self.config, shutdown).await?;
        Ok(())
    }

    /// Start, bind `address` and serve until SIGINT or SIGTERM.
    pub async fn listen(&mut self, address: &str) -> Result<(), PipelineError> {
        let pipeline = self.start()?;
        let listener = Listener::bind_addr(address, self.config.listener.max_connections).await?;
        net::serve(listener, pipeline, &self.config, shutdown_signal()).await?;
        Ok(())
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("name", &self.name())
            .field("running", &self.is_running())
            .field("routes", &self.routes().len())
            .finish()
    }
}

/// The frozen request entry point of a running server.
pub struct Pipeline {
    entry: RequestHandler,
    pool: Arc<ContextPool>,
    handle: Arc<ServerHandle>,
    logger: Span,
    routes: Vec<Route>,
}

impl Pipeline {
    /// Run one exchange through global middleware and routing.
    ///
    /// Always returns an exchange; request errors and panics are written
    /// into its response.
    pub fn serve(&self, exchange: Exchange) -> Exchange {
        let start = Instant::now();
        let method = exchange.request().method().clone();

        let mut ctx = self.pool.acquire();
        ctx.attach(exchange);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.entry.call(&mut ctx)));

        let mut exchange = ctx.detach().unwrap_or_else(Exchange::internal_error);
        drop(ctx);

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                if translate_error(&mut exchange, &error) {
                    tracing::warn!(
                        parent: &self.logger,
                        method = %method,
                        path = %exchange.request().uri().path(),
                        status = exchange.response().status().as_u16(),
                        error = %error,
                        "Request failed"
                    );
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    parent: &self.logger,
                    method = %method,
                    path = %exchange.request().uri().path(),
                    panic = %message,
                    "Handler panicked"
                );
                metrics::record_panic();
                *exchange.response_mut() = Response::new(Bytes::new());
                translate_error(&mut exchange, &HttpError::internal("Internal Server Error"));
            }
        }

        metrics::record_request(method.as_str(), exchange.response().status().as_u16(), start);
        exchange
    }

    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("server", &self.handle.name())
            .field("routes", &self.routes)
            .field("pool", &self.pool)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
