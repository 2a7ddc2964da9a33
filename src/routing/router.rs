//! Path lookup behind a small trait seam.
//!
//! # Responsibilities
//! - Store one composed handler per (method, pattern)
//! - Look up the handler and path parameters for a request
//! - Report which methods exist for a path that matched under another method
//!
//! # Design Decisions
//! - Immutable after start (thread-safe without locks)
//! - One radix tree per method (`matchit`)
//! - Explicit NotFound / MethodNotAllowed rather than a silent default

use std::collections::HashMap;

use axum::http::Method;

use crate::error::PipelineError;
use crate::handler::RequestHandler;

/// Result of a path lookup.
#[derive(Debug)]
pub enum Lookup {
    /// A handler was registered for this method and path.
    Found {
        handler: RequestHandler,
        params: Vec<(String, String)>,
    },
    /// The path exists, but only under the listed methods.
    MethodNotAllowed(Vec<Method>),
    /// Nothing matches the path.
    NotFound,
}

/// An external path router.
pub trait PathRouter: Send + Sync {
    /// Register `handler` for `method` and `path`.
    fn insert(&mut self, method: Method, path: &str, handler: RequestHandler) -> Result<(), PipelineError>;

    /// Find the handler for a request.
    fn lookup(&self, method: &Method, path: &str) -> Lookup;
}

/// Default router: one `matchit` tree per method.
#[derive(Default)]
pub struct MatchitRouter {
    trees: HashMap<Method, matchit::Router<RequestHandler>>,
}

impl MatchitRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathRouter for MatchitRouter {
    fn insert(&mut self, method: Method, path: &str, handler: RequestHandler) -> Result<(), PipelineError> {
        self.trees
            .entry(method.clone())
            .or_default()
            .insert(path, handler)
            .map_err(|source| PipelineError::RouteConflict {
                method,
                path: path.to_string(),
                source,
            })
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        if let Some(matched) = self.trees.get(method).and_then(|tree| tree.at(path).ok()) {
            return Lookup::Found {
                handler: matched.value.clone(),
                params: matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
        }

        let mut allowed: Vec<Method> = self
            .trees
            .iter()
            .filter(|(m, tree)| *m != method && tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            Lookup::MethodNotAllowed(allowed)
        }
    }
}

impl std::fmt::Debug for MatchitRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchitRouter")
            .field("methods", &self.trees.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> RequestHandler {
        RequestHandler::new(|_| Ok(()))
    }

    #[test]
    fn captures_named_and_catch_all_params() {
        let mut router = MatchitRouter::new();
        router.insert(Method::GET, "/users/{id}", noop()).unwrap();
        router.insert(Method::GET, "/assets/{*path}", noop()).unwrap();

        match router.lookup(&Method::GET, "/users/42") {
            Lookup::Found { params, .. } => assert_eq!(params, [("id".to_string(), "42".to_string())]),
            other => panic!("unexpected {other:?}"),
        }
        match router.lookup(&Method::GET, "/assets/css/site.css") {
            Lookup::Found { params, .. } => assert_eq!(params[0].1, "css/site.css"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_method_reports_allowed_list() {
        let mut router = MatchitRouter::new();
        router.insert(Method::POST, "/items", noop()).unwrap();
        router.insert(Method::GET, "/items", noop()).unwrap();

        match router.lookup(&Method::DELETE, "/items") {
            Lookup::MethodNotAllowed(methods) => assert_eq!(methods, [Method::GET, Method::POST]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(router.lookup(&Method::GET, "/nope"), Lookup::NotFound));
    }

    #[test]
    fn conflicting_pattern_is_rejected() {
        let mut router = MatchitRouter::new();
        router.insert(Method::GET, "/users/{id}", noop()).unwrap();
        let err = router.insert(Method::GET, "/users/{name}", noop()).unwrap_err();
        assert!(matches!(err, PipelineError::RouteConflict { .. }));

        router.insert(Method::POST, "/users/{name}", noop()).unwrap();
    }
}
