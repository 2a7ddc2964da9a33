//! Built-in middleware.
//!
//! Each constructor returns a [`HandlerLike`](crate::handler::HandlerLike)
//! usable anywhere before the terminal handler of a chain.

mod logger;
mod request_id;

pub use logger::logger;
pub use request_id::request_id;
