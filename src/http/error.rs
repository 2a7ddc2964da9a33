//! Request-level errors and their translation into responses.

use axum::http::{header, HeaderValue, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::context::Exchange;

/// Error returned by a handler for a single request.
///
/// The status is optional; translation falls back to 500.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    status: Option<StatusCode>,
    message: String,
}

/// JSON body written for clients that accept `application/json`.
#[derive(Debug, Serialize)]
struct ErrorEntity<'a> {
    code: u16,
    message: &'a str,
}

impl HttpError {
    /// An error with an explicit status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// An error carrying only a status; the message is its reason phrase.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            message: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        }
    }

    /// An error without a status code.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status used when writing the error out.
    pub fn effective_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(e: serde_json::Error) -> Self {
        HttpError::internal(e.to_string())
    }
}

impl From<std::io::Error> for HttpError {
    fn from(e: std::io::Error) -> Self {
        HttpError::internal(e.to_string())
    }
}

/// Write `error` into the exchange's response.
///
/// A response already marked 404 by the router is left untouched.
/// Returns whether the response was rewritten.
pub fn translate_error(exchange: &mut Exchange, error: &HttpError) -> bool {
    if exchange.response().status() == StatusCode::NOT_FOUND {
        return false;
    }

    let status = error.effective_status();
    let wants_json = exchange
        .request()
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    let (content_type, body) = if wants_json {
        let entity = ErrorEntity {
            code: status.as_u16(),
            message: error.message(),
        };
        match serde_json::to_vec(&entity) {
            Ok(bytes) => ("application/json; charset=utf-8", Bytes::from(bytes)),
            Err(_) => ("text/plain; charset=utf-8", Bytes::from(error.message().to_string())),
        }
    } else {
        ("text/plain; charset=utf-8", Bytes::from(error.message().to_string()))
    };

    let response = exchange.response_mut();
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    *response.body_mut() = body;
    true
}
