use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::radix::RadixRouter;
use crate::wire::Operation;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated path parameter storage.
///
/// Names are `Arc<str>` shared with the route tree; values are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// One wired route: a verb and URI pattern bound to a resource operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub method: Method,
    /// URI pattern with `{param}` segments (e.g. `/widgets/{id}`)
    pub path_pattern: String,
    /// Name of the resource the route belongs to
    pub resource: Arc<str>,
    pub operation: Operation,
}

/// Result of matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteMeta>,
    /// Path parameters extracted from the URL, in path order
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Matches requests against the wired route table using a radix tree.
#[derive(Clone)]
pub struct Router {
    radix_router: RadixRouter,
    routes: Vec<Arc<RouteMeta>>,
}

impl Router {
    #[must_use]
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        let routes: Vec<Arc<RouteMeta>> = routes.into_iter().map(Arc::new).collect();
        let radix_router = RadixRouter::new(&routes);

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.path_pattern))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Self {
            radix_router,
            routes,
        }
    }

    /// Registered routes in wiring order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<RouteMeta>] {
        &self.routes
    }

    /// One `METHOD path -> resource.operation` line per route.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| {
                format!(
                    "{:<7} {} -> {}.{}",
                    r.method.as_str(),
                    r.path_pattern,
                    r.resource,
                    r.operation
                )
            })
            .collect()
    }

    /// Match a request. `None` means no route serves this method and path.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = Instant::now();
        let result = self.radix_router.route(method, path);
        let match_duration = match_start.elapsed();

        match result {
            Some((route, path_params)) => {
                if match_duration > Duration::from_millis(1) {
                    warn!(
                        method = %method,
                        path = %path,
                        route_pattern = %route.path_pattern,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                }
                info!(
                    method = %method,
                    path = %path,
                    resource = %route.resource,
                    operation = %route.operation,
                    route_pattern = %route.path_pattern,
                    path_params = ?path_params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
                Some(RouteMatch { route, path_params })
            }
            None => {
                warn!(
                    method = %method,
                    path = %path,
                    path_known = self.radix_router.path_known(path),
                    "No route matched"
                );
                None
            }
        }
    }
}
