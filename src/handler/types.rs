//! Canonical handler contracts.

use std::fmt;
use std::sync::Arc;

use crate::context::{Context, Exchange};
use crate::http::HttpError;

type HandlerFn = dyn Fn(&mut Context) -> Result<(), HttpError> + Send + Sync;
type MiddlewareFn = dyn Fn(RequestHandler) -> RequestHandler + Send + Sync;
type ContinuationFn = dyn Fn(&mut Context, &RequestHandler) -> Result<(), HttpError> + Send + Sync;
type RawFn = dyn Fn(&mut Exchange) + Send + Sync;

/// The canonical unit of work: `(Context) -> Result<(), HttpError>`.
pub struct RequestHandler {
    inner: Arc<HandlerFn>,
}

impl RequestHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> Result<(), HttpError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    #[inline]
    pub fn call(&self, ctx: &mut Context) -> Result<(), HttpError> {
        (self.inner)(ctx)
    }
}

impl Clone for RequestHandler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestHandler { ... }")
    }
}

/// A handler transformer: `(RequestHandler) -> RequestHandler`.
pub struct MiddlewareHandler {
    inner: Arc<MiddlewareFn>,
}

impl MiddlewareHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(RequestHandler) -> RequestHandler + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wrap `next`, producing the handler one layer further out.
    pub fn wrap(&self, next: RequestHandler) -> RequestHandler {
        (self.inner)(next)
    }
}

impl Clone for MiddlewareHandler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for MiddlewareHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MiddlewareHandler { ... }")
    }
}

/// Explicit-continuation middleware: `(Context, next) -> Result`.
pub struct ContinuationHandler {
    inner: Arc<ContinuationFn>,
}

impl ContinuationHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context, &RequestHandler) -> Result<(), HttpError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    #[inline]
    pub fn call(&self, ctx: &mut Context, next: &RequestHandler) -> Result<(), HttpError> {
        (self.inner)(ctx, next)
    }
}

impl Clone for ContinuationHandler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Transport-level handler working on the bare exchange, without a result.
pub struct RawHandler {
    inner: Arc<RawFn>,
}

impl RawHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Exchange) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    #[inline]
    pub fn call(&self, exchange: &mut Exchange) {
        (self.inner)(exchange)
    }
}

impl Clone for RawHandler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
