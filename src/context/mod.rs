//! Per-request context subsystem.
//!
//! # Data Flow
//! ```text
//! transport delivers Exchange
//!     → pool.rs (acquire a detached Context)
//!     → context.rs (attach exchange, run composed handler)
//!     → context.rs (detach exchange, hand it back to transport)
//!     → pool.rs (reset + return on guard drop)
//! ```
//!
//! # Design Decisions
//! - A context is attached to at most one exchange at a time
//! - Logger and server handle are shared read-only; the exchange and
//!   locals are exclusive to the request
//! - Accessors on a detached context return errors instead of panicking

#[allow(clippy::module_inception)]
pub mod context;
pub mod exchange;
pub mod handle;
pub mod link;
pub mod pool;

pub use context::Context;
pub use exchange::Exchange;
pub use handle::ServerHandle;
pub use link::Link;
pub use pool::{ContextPool, PooledContext};
