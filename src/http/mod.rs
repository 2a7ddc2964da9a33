//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! net::transport (hyper connection, tower-http layers)
//!     → service.rs (GET-only check, buffer body, spawn_blocking)
//!     → server.rs Pipeline::serve (pooled Context, global chain, routing)
//!     → error.rs (translate request errors into the response)
//!     → Exchange written back to the client
//! ```

pub mod error;
pub mod middleware;
pub mod request;
pub mod server;
pub mod service;

pub use error::{translate_error, HttpError};
pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use server::{Pipeline, Server};
pub use service::DispatchService;
