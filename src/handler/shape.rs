//! Supported handler shapes and their normalization.
//!
//! The shape of a value is fixed when it is constructed; normalization
//! only matches on the variant, once, at registration time.

use crate::context::{Context, Exchange};
use crate::error::{PipelineError, Position};
use crate::handler::types::{ContinuationHandler, MiddlewareHandler, RawHandler, RequestHandler};
use crate::http::HttpError;

/// Any value accepted where a handler or middleware is expected.
#[derive(Clone)]
pub enum HandlerLike {
    /// Canonical request handler.
    Handler(RequestHandler),
    /// Canonical middleware.
    Middleware(MiddlewareHandler),
    /// `(Context, next)` middleware.
    Continuation(ContinuationHandler),
    /// Handler on the bare exchange; never fails.
    Raw(RawHandler),
    /// Handler bridged from another HTTP ecosystem.
    Foreign(RequestHandler),
}

impl HandlerLike {
    /// Short name used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            HandlerLike::Handler(_) => "request handler",
            HandlerLike::Middleware(_) => "middleware",
            HandlerLike::Continuation(_) => "continuation",
            HandlerLike::Raw(_) => "raw handler",
            HandlerLike::Foreign(_) => "foreign handler",
        }
    }

    /// Normalize for the last slot of a chain.
    pub fn into_request_handler(self) -> Result<RequestHandler, PipelineError> {
        match self {
            HandlerLike::Handler(h) | HandlerLike::Foreign(h) => Ok(h),
            HandlerLike::Raw(raw) => Ok(raw_to_handler(raw)),
            other @ (HandlerLike::Middleware(_) | HandlerLike::Continuation(_)) => {
                Err(PipelineError::UnsupportedShape {
                    shape: other.shape(),
                    position: Position::Terminal,
                })
            }
        }
    }

    /// Normalize for any slot before the last one.
    ///
    /// A plain handler in this position runs first and passes control on
    /// to the rest of the chain only when it succeeds.
    pub fn into_middleware(self) -> Result<MiddlewareHandler, PipelineError> {
        match self {
            HandlerLike::Middleware(m) => Ok(m),
            HandlerLike::Handler(h) => Ok(filter(h)),
            HandlerLike::Raw(raw) => Ok(filter(raw_to_handler(raw))),
            HandlerLike::Continuation(c) => Ok(MiddlewareHandler::new(move |next| {
                let c = c.clone();
                RequestHandler::new(move |ctx| c.call(ctx, &next))
            })),
            other @ HandlerLike::Foreign(_) => Err(PipelineError::UnsupportedShape {
                shape: other.shape(),
                position: Position::Middleware,
            }),
        }
    }
}

impl std::fmt::Debug for HandlerLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HandlerLike({})", self.shape())
    }
}

impl From<RequestHandler> for HandlerLike {
    fn from(h: RequestHandler) -> Self {
        HandlerLike::Handler(h)
    }
}

impl From<MiddlewareHandler> for HandlerLike {
    fn from(m: MiddlewareHandler) -> Self {
        HandlerLike::Middleware(m)
    }
}

impl From<ContinuationHandler> for HandlerLike {
    fn from(c: ContinuationHandler) -> Self {
        HandlerLike::Continuation(c)
    }
}

impl From<RawHandler> for HandlerLike {
    fn from(r: RawHandler) -> Self {
        HandlerLike::Raw(r)
    }
}

fn raw_to_handler(raw: RawHandler) -> RequestHandler {
    RequestHandler::new(move |ctx| {
        raw.call(ctx.exchange_mut()?);
        Ok(())
    })
}

fn filter(h: RequestHandler) -> MiddlewareHandler {
    MiddlewareHandler::new(move |next| {
        let h = h.clone();
        RequestHandler::new(move |ctx| {
            h.call(ctx)?;
            next.call(ctx)
        })
    })
}

/// A request handler from a closure.
pub fn handler<F>(f: F) -> HandlerLike
where
    F: Fn(&mut Context) -> Result<(), HttpError> + Send + Sync + 'static,
{
    HandlerLike::Handler(RequestHandler::new(f))
}

/// A middleware from a closure transforming the next handler.
pub fn middleware<F>(f: F) -> HandlerLike
where
    F: Fn(RequestHandler) -> RequestHandler + Send + Sync + 'static,
{
    HandlerLike::Middleware(MiddlewareHandler::new(f))
}

/// A middleware that receives `next` explicitly and decides when to call it.
pub fn continuation<F>(f: F) -> HandlerLike
where
    F: Fn(&mut Context, &RequestHandler) -> Result<(), HttpError> + Send + Sync + 'static,
{
    HandlerLike::Continuation(ContinuationHandler::new(f))
}

/// A handler on the bare exchange.
pub fn raw<F>(f: F) -> HandlerLike
where
    F: Fn(&mut Exchange) + Send + Sync + 'static,
{
    HandlerLike::Raw(RawHandler::new(f))
}
