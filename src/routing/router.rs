//! Route table: maps (method, path) to a handler.
//!
//! # Responsibilities
//! - Register routes at startup, rejecting overlapping registrations
//! - Resolve a request to exactly one route, or explain why none matched
//! - Stay read-only once the server is serving
//!
//! # Design Decisions
//! - Routes kept sorted by specificity (literal > template > wildcard)
//! - On the same pattern an explicit method set beats `All`
//! - Generic over the handler so routing knows nothing about endpoints

use axum::http::Method;

use crate::routing::matcher::{Matcher, PathParams};
use crate::routing::RouteError;

/// Stable index of a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub usize);

/// A registered route.
#[derive(Debug)]
pub struct Route<H> {
    pub id: RouteId,
    pub matcher: Matcher,
    pub handler: H,
}

/// A successful resolution.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub path_params: PathParams,
}

/// Outcome of [`RouteTable::resolve`].
#[derive(Debug)]
pub enum Resolution<'a, H> {
    Matched(RouteMatch<'a, H>),
    /// The path exists but no route on it accepts this method.
    MethodNotAllowed { allowed: Vec<Method> },
    NoMatch,
}

/// Immutable-after-startup route table.
#[derive(Debug)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
    /// Indices into `routes`, most specific first.
    order: Vec<usize>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Add a route. Fails if an existing route claims the same pattern
    /// for an overlapping method set.
    pub fn register(&mut self, matcher: Matcher, handler: H) -> Result<RouteId, RouteError> {
        let canonical = matcher.pattern.canonical();
        if let Some(existing) = self.routes.iter().find(|r| {
            r.matcher.pattern.canonical() == canonical && r.matcher.methods.overlaps(&matcher.methods)
        }) {
            return Err(RouteError::Conflict {
                existing: existing.matcher.to_string(),
                new: matcher.to_string(),
            });
        }

        let id = RouteId(self.routes.len());
        self.routes.push(Route { id, matcher, handler });
        self.order.push(id.0);

        let routes = &self.routes;
        self.order.sort_by_key(|&i| {
            let m = &routes[i].matcher;
            (m.pattern.specificity(), m.methods.is_all(), i)
        });
        Ok(id)
    }

    /// Find the route for a request.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, H> {
        let mut allowed: Vec<Method> = Vec::new();
        let mut path_matched = false;

        for &index in &self.order {
            let route = &self.routes[index];
            let Some(path_params) = route.matcher.pattern.matches(path) else {
                continue;
            };
            if route.matcher.methods.contains(method) {
                return Resolution::Matched(RouteMatch { route, path_params });
            }
            path_matched = true;
            if let crate::routing::MethodSet::Only(methods) = &route.matcher.methods {
                for m in methods {
                    if !allowed.contains(m) {
                        allowed.push(m.clone());
                    }
                }
            }
        }

        if path_matched {
            Resolution::MethodNotAllowed { allowed }
        } else {
            Resolution::NoMatch
        }
    }

    pub fn get(&self, id: RouteId) -> Option<&Route<H>> {
        self.routes.get(id.0)
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table
            .register(Matcher::match_methods("/example", [Method::GET]).unwrap(), "get")
            .unwrap();
        table
            .register(Matcher::match_methods("/example", [Method::POST]).unwrap(), "post")
            .unwrap();
        table
            .register(Matcher::match_all_methods("/healthcheck").unwrap(), "health")
            .unwrap();
        table
            .register(Matcher::match_all_methods("/things/{id}").unwrap(), "thing")
            .unwrap();
        table
            .register(Matcher::match_methods("/things/special", [Method::GET]).unwrap(), "special")
            .unwrap();
        table
    }

    fn handler<'a>(resolution: Resolution<'a, &'static str>) -> Option<&'static str> {
        match resolution {
            Resolution::Matched(m) => Some(m.route.handler),
            _ => None,
        }
    }

    #[test]
    fn test_resolves_by_method() {
        let table = table();
        assert_eq!(handler(table.resolve(&Method::GET, "/example")), Some("get"));
        assert_eq!(handler(table.resolve(&Method::POST, "/example")), Some("post"));
    }

    #[test]
    fn test_all_methods_route() {
        let table = table();
        for method in [Method::GET, Method::DELETE, Method::OPTIONS] {
            assert_eq!(handler(table.resolve(&method, "/healthcheck")), Some("health"));
        }
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        match table().resolve(&Method::PUT, "/example") {
            Resolution::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_no_match() {
        assert!(matches!(table().resolve(&Method::GET, "/missing"), Resolution::NoMatch));
    }

    #[test]
    fn test_literal_beats_template() {
        let table = table();
        assert_eq!(handler(table.resolve(&Method::GET, "/things/special")), Some("special"));
        // Template still serves other methods on the same path.
        assert_eq!(handler(table.resolve(&Method::POST, "/things/special")), Some("thing"));

        match table.resolve(&Method::GET, "/things/7") {
            Resolution::Matched(m) => assert_eq!(m.path_params["id"], "7"),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_explicit_method_beats_all_on_same_pattern() {
        let mut table = RouteTable::new();
        table
            .register(Matcher::match_all_methods("/proxy").unwrap(), "all")
            .unwrap();
        table
            .register(Matcher::match_methods("/proxy", [Method::GET]).unwrap(), "get")
            .unwrap();

        assert_eq!(handler(table.resolve(&Method::GET, "/proxy")), Some("get"));
        assert_eq!(handler(table.resolve(&Method::PATCH, "/proxy")), Some("all"));
    }

    #[test]
    fn test_conflicting_registration_fails() {
        let mut table = table();
        let err = table
            .register(
                Matcher::match_methods("/example", [Method::PUT, Method::POST]).unwrap(),
                "dup",
            )
            .unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));

        let err = table
            .register(Matcher::match_all_methods("/things/{other}").unwrap(), "dup")
            .unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
        assert_eq!(table.len(), 5);
    }
}
