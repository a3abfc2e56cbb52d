//! Radix tree for HTTP route matching.
//!
//! Paths are split into segments and stored in a tree where:
//! - each node represents one path segment
//! - static segments (e.g. `widgets`) match exactly and are tried first
//! - parameter segments (e.g. `{id}`) match any single segment
//! - routes are stored at terminal nodes, keyed by HTTP method
//!
//! Lookup is O(k) in the number of path segments, independent of how many
//! resources are wired.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::{ParamVec, RouteMeta};

#[derive(Clone)]
struct RadixNode {
    /// The path segment this node represents (without leading /)
    segment: Arc<str>,
    /// Routes terminating at this node, per HTTP method
    routes: HashMap<Method, Arc<RouteMeta>>,
    /// Parameter name if this segment is a path parameter (`{id}` -> `id`)
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode>,
    /// Parameter children. Several are allowed so that `/a/{id}/x` and
    /// `/a/{slug}/y` each keep their own parameter name.
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: Arc::from(segment),
            routes: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(param_name)),
            ..Self::new("")
        }
    }

    fn insert(&mut self, segments: &[&str], method: Method, route: Arc<RouteMeta>) {
        let Some((segment, remaining)) = segments.split_first() else {
            self.routes.insert(method, route);
            return;
        };

        if let Some(param_name) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param_name.as_deref() == Some(param_name))
            {
                child.insert(remaining, method, route);
                return;
            }
            let mut child = RadixNode::new_param(param_name);
            child.insert(remaining, method, route);
            self.param_children.push(child);
            return;
        }

        if let Some(child) = self
            .children
            .iter_mut()
            .find(|c| c.segment.as_ref() == *segment)
        {
            child.insert(remaining, method, route);
            return;
        }
        let mut child = RadixNode::new(segment);
        child.insert(remaining, method, route);
        self.children.push(child);
    }

    /// Depth-first search. Static children win over parameters; parameters are
    /// pushed onto `params` and popped again when a branch fails.
    fn search(
        &self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
    ) -> Option<Arc<RouteMeta>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.routes.get(method).cloned();
        };

        for child in &self.children {
            if child.segment.as_ref() == *segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        for child in &self.param_children {
            if let Some(name) = &child.param_name {
                params.push((Arc::clone(name), (*segment).to_string()));
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
                params.pop();
            }
        }

        None
    }

    /// True when any route exists at the end of `segments`, for any method.
    fn has_path(&self, segments: &[&str]) -> bool {
        let Some((segment, remaining)) = segments.split_first() else {
            return !self.routes.is_empty();
        };
        self.children
            .iter()
            .filter(|c| c.segment.as_ref() == *segment)
            .chain(self.param_children.iter())
            .any(|c| c.has_path(remaining))
    }
}

/// Radix tree router keyed by method and path pattern.
#[derive(Clone)]
pub struct RadixRouter {
    root: RadixNode,
}

impl RadixRouter {
    pub fn new(routes: &[Arc<RouteMeta>]) -> Self {
        let mut root = RadixNode::new("");
        for route in routes {
            let segments = split_path(&route.path_pattern);
            root.insert(&segments, route.method.clone(), Arc::clone(route));
        }
        Self { root }
    }

    pub fn route(&self, method: &Method, path: &str) -> Option<(Arc<RouteMeta>, ParamVec)> {
        let segments = split_path(path);
        let mut params = ParamVec::new();
        let route = self.root.search(&segments, method, &mut params)?;
        Some((route, params))
    }

    /// Whether `path` is served by some route under a different method.
    pub fn path_known(&self, path: &str) -> bool {
        self.root.has_path(&split_path(path))
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Operation;

    fn meta(method: Method, path: &str, operation: Operation) -> Arc<RouteMeta> {
        Arc::new(RouteMeta {
            method,
            path_pattern: path.to_string(),
            resource: Arc::from("widgets"),
            operation,
        })
    }

    fn param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_static_route() {
        let router = RadixRouter::new(&[meta(Method::GET, "/widgets", Operation::List)]);
        let (route, params) = router.route(&Method::GET, "/widgets").unwrap();
        assert_eq!(route.operation, Operation::List);
        assert!(params.is_empty());
    }

    #[test]
    fn test_parameter_extracted() {
        let router = RadixRouter::new(&[meta(Method::GET, "/widgets/{id}", Operation::View)]);
        let (route, params) = router.route(&Method::GET, "/widgets/123").unwrap();
        assert_eq!(route.operation, Operation::View);
        assert_eq!(param(&params, "id"), Some("123"));
    }

    #[test]
    fn test_method_filtering() {
        let router = RadixRouter::new(&[
            meta(Method::GET, "/widgets", Operation::List),
            meta(Method::POST, "/widgets", Operation::Create),
        ]);
        assert_eq!(
            router.route(&Method::POST, "/widgets").map(|(r, _)| r.operation),
            Some(Operation::Create)
        );
        assert!(router.route(&Method::PUT, "/widgets").is_none());
        assert!(router.path_known("/widgets"));
        assert!(!router.path_known("/gadgets"));
    }

    #[test]
    fn test_static_beats_parameter() {
        let router = RadixRouter::new(&[
            meta(Method::GET, "/widgets/{id}", Operation::View),
            meta(Method::GET, "/widgets/featured", Operation::List),
        ]);
        let (route, params) = router.route(&Method::GET, "/widgets/featured").unwrap();
        assert_eq!(route.operation, Operation::List);
        assert!(params.is_empty());
    }

    #[test]
    fn test_divergent_param_names_backtrack() {
        let router = RadixRouter::new(&[
            meta(Method::GET, "/shops/{shop}/items", Operation::List),
            meta(Method::GET, "/shops/{id}/orders/{order}", Operation::View),
        ]);
        let (_, params) = router.route(&Method::GET, "/shops/7/orders/9").unwrap();
        assert_eq!(param(&params, "id"), Some("7"));
        assert_eq!(param(&params, "order"), Some("9"));
        assert_eq!(param(&params, "shop"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_no_match() {
        let router = RadixRouter::new(&[meta(Method::GET, "/widgets/{id}", Operation::View)]);
        assert!(router.route(&Method::GET, "/widgets").is_none());
        assert!(router.route(&Method::GET, "/widgets/1/extra").is_none());
    }
}
