//! Handler normalization and composition subsystem.
//!
//! # Data Flow
//! ```text
//! Registration time:
//!     handler(), middleware(), continuation(), raw(), service()
//!     → shape.rs (HandlerLike, tagged once at construction)
//!     → compose.rs (last = terminal, rest = middleware, fold right-to-left)
//!     → one RequestHandler per route / per global chain
//!
//! Request time:
//!     composed RequestHandler called directly; no shape inspection
//! ```
//!
//! # Design Decisions
//! - First-registered middleware is the outermost layer
//! - Unsupported shapes fail the registration call, never a request
//! - Handlers are `Arc`ed closures, cheap to clone into chains

pub mod compose;
pub mod foreign;
pub mod registry;
pub mod shape;
pub mod types;

pub use compose::{compose, fold, Chain};
pub use foreign::service;
pub use registry::HandlerRegistry;
pub use shape::{continuation, handler, middleware, raw, HandlerLike};
pub use types::{ContinuationHandler, MiddlewareHandler, RawHandler, RequestHandler};
