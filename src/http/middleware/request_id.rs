//! Request id middleware.

use axum::http::HeaderValue;

use crate::handler::{continuation, HandlerLike};
use crate::http::request::{RequestId, RequestIdExt, X_REQUEST_ID};

/// Store a [`RequestId`] in the context and echo it on the response.
///
/// The inbound `x-request-id` header is reused when present; otherwise a
/// UUID v4 is generated.
pub fn request_id() -> HandlerLike {
    continuation(|ctx, next| {
        let id = ctx.request_id().unwrap_or_else(RequestId::generate);
        ctx.insert(id.clone());

        let result = next.call(ctx);

        if let Ok(value) = HeaderValue::from_str(id.as_str()) {
            ctx.set_header(X_REQUEST_ID, value)?;
        }
        result
    })
}
