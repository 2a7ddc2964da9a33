//! Request identification.
//!
//! # Responsibilities
//! - Carry the request id assigned at the transport edge into handlers
//! - Give handlers a typed accessor instead of raw header parsing
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (tower-http layer)
//! - A client-supplied `x-request-id` is kept, not replaced

use std::fmt;

use axum::http::HeaderName;

use crate::context::Context;

/// Header carrying the request id in both directions.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Identifier of one request, stored in the context locals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh UUID v4 id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to the request id of the current request.
pub trait RequestIdExt {
    /// The id stored by the request_id middleware, else the inbound header.
    fn request_id(&self) -> Option<RequestId>;
}

impl RequestIdExt for Context {
    fn request_id(&self) -> Option<RequestId> {
        if let Some(id) = self.get::<RequestId>() {
            return Some(id.clone());
        }
        self.request()
            .ok()?
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Exchange;
    use axum::http::Request;
    use bytes::Bytes;

    #[test]
    fn falls_back_to_header() {
        let request = Request::builder()
            .header(X_REQUEST_ID, "abc")
            .body(Bytes::new())
            .unwrap();
        let mut ctx = Context::standalone(Exchange::new(request));
        assert_eq!(ctx.request_id(), Some(RequestId::new("abc")));

        ctx.insert(RequestId::new("stored"));
        assert_eq!(ctx.request_id().unwrap().as_str(), "stored");
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
