//! Tower service bridging the transport to the pipeline.
//!
//! # Responsibilities
//! - Enforce the GET-only option before the pipeline runs
//! - Buffer the request body (size already bounded by the limit layer)
//! - Run the synchronous pipeline on the blocking pool
//! - Turn the finished exchange into the wire response

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full, LengthLimitError};
use hyper::body::Body;
use tower::Service;

use crate::context::Exchange;
use crate::http::server::Pipeline;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Innermost service of the transport stack. Cloned per connection.
#[derive(Clone, Debug)]
pub struct DispatchService {
    pipeline: Arc<Pipeline>,
    get_only: bool,
    remote_addr: Option<SocketAddr>,
}

impl DispatchService {
    pub fn new(pipeline: Arc<Pipeline>, get_only: bool) -> Self {
        Self {
            pipeline,
            get_only,
            remote_addr: None,
        }
    }

    /// The same service bound to one peer.
    pub fn for_peer(&self, addr: SocketAddr) -> Self {
        Self {
            remote_addr: Some(addr),
            ..self.clone()
        }
    }
}

impl<B> Service<Request<B>> for DispatchService
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let pipeline = Arc::clone(&self.pipeline);
        let get_only = self.get_only;
        let remote_addr = self.remote_addr;

        Box::pin(async move {
            if get_only && request.method() != Method::GET {
                let mut response = plain(StatusCode::METHOD_NOT_ALLOWED);
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("GET"));
                return Ok(response);
            }

            let (parts, body) = request.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e: BoxError = e.into();
                    if e.downcast_ref::<LengthLimitError>().is_some() {
                        return Ok(plain(StatusCode::PAYLOAD_TOO_LARGE));
                    }
                    tracing::debug!(error = %e, "Failed to read request body");
                    return Ok(plain(StatusCode::BAD_REQUEST));
                }
            };

            let mut exchange = Exchange::new(Request::from_parts(parts, body));
            if let Some(addr) = remote_addr {
                exchange = exchange.with_remote_addr(addr);
            }

            let exchange = match tokio::task::spawn_blocking(move || pipeline.serve(exchange)).await {
                Ok(exchange) => exchange,
                Err(e) => {
                    tracing::error!(error = %e, "Pipeline task failed");
                    return Ok(plain(StatusCode::INTERNAL_SERVER_ERROR));
                }
            };

            let (parts, body) = exchange.into_response().into_parts();
            Ok(Response::from_parts(parts, Full::new(body)))
        })
    }
}

/// A bodyless-looking response carrying the reason phrase.
fn plain(status: StatusCode) -> Response<Full<Bytes>> {
    let reason = status.canonical_reason().unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from_static(reason.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
