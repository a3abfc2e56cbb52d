//! # Router Module
//!
//! Matches incoming requests to the routes produced by [`crate::wire`].
//!
//! Route patterns (e.g. `/widgets/{id}`) are inserted into a radix tree at startup.
//! Matching a request walks the tree segment by segment, preferring static segments
//! over parameters and backtracking when a branch dead-ends, and returns the route
//! metadata plus the raw path parameters as strings. Turning those strings into
//! typed values is the job of [`crate::coerce`].

mod core;
mod radix;

pub use core::{ParamVec, RouteMatch, RouteMeta, Router, MAX_INLINE_PARAMS};
