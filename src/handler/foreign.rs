//! Bridge for handlers written against the `tower`/`axum` ecosystem.
//!
//! Any `tower::Service` over `http::Request<axum::body::Body>` (an
//! `axum::Router`, a `tower::service_fn`, ...) becomes a terminal handler.
//! The service is cloned per request and driven to completion on the
//! current tokio runtime; the transport always invokes the pipeline from
//! the blocking pool, where that is allowed.

use std::fmt::Display;

use axum::body::{Body, HttpBody};
use axum::http::{Request, Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use tokio::runtime::Handle;
use tower::{Service, ServiceExt};

use crate::handler::shape::HandlerLike;
use crate::handler::types::RequestHandler;
use crate::http::HttpError;

/// Adapt a tower service into a terminal handler.
pub fn service<S, B>(svc: S) -> HandlerLike
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Display,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Display,
{
    HandlerLike::Foreign(RequestHandler::new(move |ctx| {
        let runtime = Handle::try_current()
            .map_err(|_| HttpError::internal("foreign handler requires a tokio runtime"))?;

        let request = to_foreign(ctx.request()?)?;
        let svc = svc.clone();

        let (parts, body) = runtime.block_on(async move {
            let response = svc
                .oneshot(request)
                .await
                .map_err(|e| HttpError::internal(e.to_string()))?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| HttpError::internal(e.to_string()))?
                .to_bytes();
            Ok::<_, HttpError>((parts, body))
        })?;

        let response = ctx.exchange_mut()?.response_mut();
        *response.status_mut() = parts.status;
        response.headers_mut().extend(parts.headers);
        *response.body_mut() = body;
        Ok(())
    }))
}

fn to_foreign(request: &Request<Bytes>) -> Result<Request<Body>, HttpError> {
    let mut builder = Request::builder()
        .method(request.method().clone())
        .uri(request.uri().clone())
        .version(request.version());

    if let Some(headers) = builder.headers_mut() {
        headers.extend(request.headers().clone());
    }

    builder
        .body(Body::from(request.body().clone()))
        .map_err(|e| HttpError::internal(e.to_string()))
}
