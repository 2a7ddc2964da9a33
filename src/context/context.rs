//! Per-request state threaded through every handler.

use std::sync::Arc;

use axum::http::{header, Extensions, HeaderName, HeaderValue, Request, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use tracing::Span;

use crate::context::{Exchange, ServerHandle};
use crate::http::HttpError;

const DETACHED: &str = "context is not attached to an exchange";

/// Mutable state for exactly one in-flight request.
///
/// Contexts are lent out by a [`ContextPool`](crate::context::ContextPool);
/// between requests the exchange slot is empty and the locals are cleared.
pub struct Context {
    /// The exchange being served, present only while attached.
    exchange: Option<Exchange>,
    /// Per-request values shared between middleware and handlers.
    locals: Extensions,
    /// Logger of the owning server.
    logger: Span,
    /// Back-reference to the owning server.
    server: Arc<ServerHandle>,
}

impl Context {
    pub(crate) fn new(logger: Span, server: Arc<ServerHandle>) -> Self {
        Self {
            exchange: None,
            locals: Extensions::new(),
            logger,
            server,
        }
    }

    /// A context outside any server, attached to `exchange`.
    ///
    /// Useful for exercising a handler directly.
    pub fn standalone(exchange: Exchange) -> Self {
        let mut ctx = Self::new(Span::none(), Arc::new(ServerHandle::default()));
        ctx.attach(exchange);
        ctx
    }

    pub(crate) fn attach(&mut self, exchange: Exchange) {
        debug_assert!(self.exchange.is_none(), "context attached twice");
        self.exchange = Some(exchange);
    }

    pub(crate) fn detach(&mut self) -> Option<Exchange> {
        self.exchange.take()
    }

    /// Drop everything tied to the last request.
    pub(crate) fn reset(&mut self) {
        self.exchange = None;
        self.locals.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.exchange.is_some()
    }

    pub fn log(&self) -> &Span {
        &self.logger
    }

    pub fn server(&self) -> &ServerHandle {
        &self.server
    }

    pub fn exchange(&self) -> Result<&Exchange, HttpError> {
        self.exchange.as_ref().ok_or_else(|| HttpError::internal(DETACHED))
    }

    pub fn exchange_mut(&mut self) -> Result<&mut Exchange, HttpError> {
        self.exchange.as_mut().ok_or_else(|| HttpError::internal(DETACHED))
    }

    pub fn request(&self) -> Result<&Request<Bytes>, HttpError> {
        self.exchange().map(Exchange::request)
    }

    pub fn path(&self) -> Result<&str, HttpError> {
        self.request().map(|req| req.uri().path())
    }

    /// Path parameter captured by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.exchange.as_ref().and_then(|ex| ex.param(name))
    }

    /// First value of a query-string parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.exchange.as_ref()?.request().uri().query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn status(&mut self, status: StatusCode) -> Result<&mut Self, HttpError> {
        *self.exchange_mut()?.response_mut().status_mut() = status;
        Ok(self)
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<&mut Self, HttpError> {
        self.exchange_mut()?.response_mut().headers_mut().insert(name, value);
        Ok(self)
    }

    /// Respond 200 with `value` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), HttpError> {
        self.json_with_status(StatusCode::OK, value)
    }

    pub fn json_with_status<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), HttpError> {
        let body = serde_json::to_vec(value)?;
        self.write(status, "application/json; charset=utf-8", Bytes::from(body))
    }

    /// Respond 200 with a plain-text body.
    pub fn text(&mut self, body: impl Into<String>) -> Result<(), HttpError> {
        self.write(
            StatusCode::OK,
            "text/plain; charset=utf-8",
            Bytes::from(body.into()),
        )
    }

    fn write(&mut self, status: StatusCode, content_type: &'static str, body: Bytes) -> Result<(), HttpError> {
        let response = self.exchange_mut()?.response_mut();
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        *response.body_mut() = body;
        Ok(())
    }

    /// Store a per-request value, replacing any previous one of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.locals.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.locals.get::<T>()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("attached", &self.is_attached())
            .field("server", &self.server.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> Exchange {
        Exchange::new(Request::builder().uri(uri).body(Bytes::new()).unwrap())
    }

    #[test]
    fn detached_accessors_report_errors() {
        let mut ctx = Context::standalone(get("/"));
        ctx.detach();

        assert!(ctx.request().is_err());
        assert!(ctx.text("hi").is_err());
        assert!(ctx.param("id").is_none());
        assert!(ctx.query("q").is_none());
    }

    #[test]
    fn json_sets_status_and_content_type() {
        let mut ctx = Context::standalone(get("/"));
        ctx.json(&serde_json::json!({ "ok": true })).unwrap();

        let ex = ctx.detach().unwrap();
        assert_eq!(ex.response().status(), StatusCode::OK);
        assert_eq!(
            ex.response().headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        assert_eq!(ex.response().body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn query_reads_first_value() {
        let ctx = Context::standalone(get("/items?page=2&page=3&q=a%20b"));
        assert_eq!(ctx.query("page").as_deref(), Some("2"));
        assert_eq!(ctx.query("q").as_deref(), Some("a b"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn reset_clears_exchange_and_locals() {
        let mut ctx = Context::standalone(get("/"));
        ctx.insert(7u32);
        assert_eq!(ctx.get::<u32>(), Some(&7));

        ctx.reset();
        assert!(!ctx.is_attached());
        assert!(ctx.get::<u32>().is_none());
    }
}
