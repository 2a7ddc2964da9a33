//! The raw request/response exchange handed over by the transport.

use std::net::SocketAddr;

use axum::http::{Request, Response, StatusCode};
use bytes::Bytes;

/// One inbound request and the response being built for it.
///
/// Owned exclusively by the context serving it; the transport writes back
/// whatever status, headers and body the pipeline left here.
#[derive(Debug)]
pub struct Exchange {
    request: Request<Bytes>,
    response: Response<Bytes>,
    /// Path parameters extracted by the router.
    params: Vec<(String, String)>,
    remote_addr: Option<SocketAddr>,
}

impl Exchange {
    /// Wrap a fully-read request. The response starts as an empty 200.
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            response: Response::new(Bytes::new()),
            params: Vec::new(),
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Stand-in used when the pipeline lost the exchange it was given.
    pub(crate) fn internal_error() -> Self {
        let mut exchange = Self::new(Request::new(Bytes::new()));
        *exchange.response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        exchange
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Bytes> {
        &mut self.request
    }

    pub fn response(&self) -> &Response<Bytes> {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response<Bytes> {
        &mut self.response
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Value of a path parameter captured by the route pattern.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: Vec<(String, String)>) {
        self.params = params;
    }

    /// Consume the exchange, yielding the response for the transport.
    pub fn into_response(self) -> Response<Bytes> {
        self.response
    }
}
