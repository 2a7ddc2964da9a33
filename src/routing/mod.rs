//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before start):
//!     Server::route / Group::route
//!     → handler::compose (one RequestHandler per route)
//!     → table.rs (RouteTable::insert)
//!     → router.rs (PathRouter, matchit trees per method)
//!
//! Request:
//!     global middleware → RouteTable dispatcher
//!     → Lookup::Found (params into Exchange) → route handler
//!     → Lookup::MethodNotAllowed → 405 + Allow
//!     → Lookup::NotFound → 404 "Not Found"
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable once the server starts
//! - Conflicting patterns fail the registration call
//! - Path router sits behind a trait so it can be swapped

pub mod group;
pub mod router;
pub mod table;

pub use group::Group;
pub use router::{Lookup, MatchitRouter, PathRouter};
pub use table::{Route, RouteTable};
