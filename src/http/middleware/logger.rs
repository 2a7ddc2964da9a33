//! Request logging middleware.

use std::time::Instant;

use crate::handler::{continuation, HandlerLike};
use crate::http::request::RequestIdExt;

/// Log the start and end of every request under the server's span.
///
/// `name` is recorded as the `middleware` field so several loggers can be
/// told apart. Errors pass through unchanged.
pub fn logger(name: impl Into<String>) -> HandlerLike {
    let name = name.into();
    continuation(move |ctx, next| {
        let span = ctx.log().clone();
        let start = Instant::now();
        let request_id = ctx.request_id().map(|id| id.to_string()).unwrap_or_default();
        {
            let request = ctx.request()?;
            let remote = ctx
                .exchange()?
                .remote_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_default();
            tracing::info!(
                parent: &span,
                middleware = %name,
                method = %request.method(),
                uri = %request.uri(),
                remote = %remote,
                request_id = %request_id,
                "started handling request"
            );
        }

        let result = next.call(ctx);

        let status = ctx.exchange()?.response().status();
        match &result {
            Ok(()) => tracing::info!(
                parent: &span,
                middleware = %name,
                status = status.as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                request_id = %request_id,
                "completed handling request"
            ),
            Err(e) => tracing::info!(
                parent: &span,
                middleware = %name,
                status = e.effective_status().as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                request_id = %request_id,
                error = %e,
                "completed handling request"
            ),
        }
        result
    })
}
