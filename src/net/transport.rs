//! HTTP/1.1 serve loop.
//!
//! # Responsibilities
//! - Accept bounded connections from the [`Listener`]
//! - Wrap the dispatch service in the tower-http layer stack
//! - Serve each connection on its own task with hyper
//! - Stop accepting on shutdown and drain within the grace period

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue};
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::server::Pipeline;
use crate::http::service::DispatchService;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};

/// Pause after a failed accept (EMFILE and friends persist).
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Serve `pipeline` on `listener` until `shutdown` resolves, then drain.
#[allow(deprecated)]
pub async fn serve<F>(
    listener: Listener,
    pipeline: Arc<Pipeline>,
    config: &ServerConfig,
    shutdown: F,
) -> Result<(), ListenerError>
where
    F: Future<Output = ()> + Send,
{
    let transport = &config.transport;
    let dispatch = DispatchService::new(pipeline, transport.get_only);
    let server_header = HeaderValue::from_str(&config.server.name)
        .unwrap_or_else(|_| HeaderValue::from_static("strata"));
    let request_timeout = Duration::from_secs(transport.request_timeout_secs);
    let read_timeout = Duration::from_secs(transport.read_timeout_secs);

    let graceful = GracefulShutdown::new();
    let tracker = ConnectionTracker::new();

    tracing::info!(
        address = ?listener.local_addr().ok(),
        name = %config.server.name,
        keepalive = !transport.disable_keepalive,
        get_only = transport.get_only,
        "HTTP server starting"
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer, permit) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => match retry_delay(&e) {
                        Some(delay) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        None => break,
                    },
                };

                let stack = ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::if_not_present(header::SERVER, server_header.clone()))
                    .layer(RequestBodyLimitLayer::new(transport.max_request_body_size))
                    .layer(TimeoutLayer::new(request_timeout))
                    .service(dispatch.for_peer(peer));

                let mut builder = http1::Builder::new();
                builder
                    .keep_alive(!transport.disable_keepalive)
                    .timer(TokioTimer::new())
                    .header_read_timeout(read_timeout);

                let connection = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(stack));
                let connection = graceful.watch(connection);
                let guard = tracker.track();

                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::debug!(connection_id = %guard.id(), error = %e, "Connection error");
                    }
                    drop(permit);
                    drop(guard);
                });
            }
            _ = &mut shutdown => {
                tracing::info!(open_connections = tracker.active_count(), "Shutdown requested, no longer accepting");
                break;
            }
        }
    }

    drop(listener);

    let grace = Duration::from_secs(transport.shutdown_grace_secs);
    tokio::select! {
        _ = graceful.shutdown() => tracing::info!("All connections drained"),
        _ = tokio::time::sleep(grace) => tracing::warn!(
            open_connections = tracker.active_count(),
            "Grace period elapsed, dropping remaining connections"
        ),
    }

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// How long to wait before accepting again, or `None` once the listener is closed.
fn retry_delay(error: &ListenerError) -> Option<Duration> {
    match error {
        ListenerError::Closed => None,
        _ => Some(ACCEPT_RETRY_DELAY),
    }
}
