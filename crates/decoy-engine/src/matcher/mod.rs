//! Stateless route selection.
//!
//! `select` filters the enabled routes by method, then by URL pattern, and
//! resolves ambiguity deterministically: when several routes match, the one
//! with the lowest insertion position wins (the earliest-created
//! still-matching enabled route). Users resolve shadowing by disabling or
//! removing the earlier rule; "most specific pattern wins" is deliberately
//! not the rule here.
//!
//! Case policy: path segments and query strings compare case-sensitively;
//! scheme and host compare case-insensitively when the pattern is a full
//! URL. A pattern without a scheme/host matches on path alone, regardless
//! of which host served the request.

pub mod pattern;

use crate::ledger::ObservedRequest;
use crate::route::Route;
use pattern::UrlPattern;
use tracing::warn;

/// Pick at most one route for an observed request.
///
/// Pure over its inputs: the caller passes a snapshot of the route
/// sequence, and repeated calls over the same snapshot return the same
/// answer.
pub fn select<'a>(request: &ObservedRequest, routes: &'a [Route]) -> Option<&'a Route> {
    routes.iter().find(|route| {
        route.enabled
            && route.request_method.matches(&request.method)
            && url_matches(route, &request.url)
    })
}

fn url_matches(route: &Route, url: &str) -> bool {
    // Validation rejects empty patterns before they reach the store; the
    // guard stays so an unvalidated route can never match everything.
    if route.request_url.is_empty() {
        warn!(route = %route.id, "route with empty requestUrl can never match");
        return false;
    }
    UrlPattern::parse(&route.request_url).matches(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::headers::Headers;
    use crate::route::{RequestMethod, RouteConfig, RouteStore};
    use chrono::Utc;

    fn request(method: &str, url: &str) -> ObservedRequest {
        ObservedRequest {
            id: "r1".to_string(),
            timestamp: Utc::now(),
            method: method.to_string(),
            url: url.to_string(),
            headers: Headers::new(),
            body: None,
        }
    }

    fn config(method: RequestMethod, url: &str) -> RouteConfig {
        RouteConfig {
            request_url: url.to_string(),
            request_method: method,
            response_data: Body::from("{}"),
            response_headers: Headers::new(),
            response_status: 200,
            enabled: true,
        }
    }

    #[test]
    fn test_select_exact_match() {
        let store = RouteStore::new();
        let id = store.add(config(RequestMethod::Get, "/api/users")).unwrap();
        let routes = store.list();

        let found = select(&request("GET", "/api/users"), &routes).unwrap();
        assert_eq!(found.id, id);
        assert!(select(&request("POST", "/api/users"), &routes).is_none());
        assert!(select(&request("GET", "/api/items"), &routes).is_none());
    }

    #[test]
    fn test_select_template_match() {
        let store = RouteStore::new();
        store
            .add(config(RequestMethod::Get, "/api/user/:id"))
            .unwrap();
        let routes = store.list();

        assert!(select(&request("GET", "/api/user/42"), &routes).is_some());
        assert!(select(&request("GET", "/api/user/42?verbose=1"), &routes).is_some());
        assert!(select(&request("GET", "/api/user"), &routes).is_none());
    }

    #[test]
    fn test_wildcard_method() {
        let store = RouteStore::new();
        store.add(config(RequestMethod::Any, "/ping")).unwrap();
        let routes = store.list();

        for method in ["GET", "POST", "DELETE", "OPTIONS"] {
            assert!(select(&request(method, "/ping"), &routes).is_some());
        }
    }

    #[test]
    fn test_disabled_routes_are_never_selected() {
        let store = RouteStore::new();
        let id = store.add(config(RequestMethod::Get, "/x")).unwrap();

        store.set_enabled(id, false).unwrap();
        assert!(select(&request("GET", "/x"), &store.list()).is_none());

        // Re-enabling restores it on the very next select
        store.set_enabled(id, true).unwrap();
        assert!(select(&request("GET", "/x"), &store.list()).is_some());
    }

    #[test]
    fn test_tie_break_earliest_insertion_wins() {
        let store = RouteStore::new();
        let a = store.add(config(RequestMethod::Get, "/x")).unwrap();
        let b = store.add(config(RequestMethod::Get, "/x")).unwrap();

        // Deterministic across repeated calls
        for _ in 0..10 {
            assert_eq!(select(&request("GET", "/x"), &store.list()).unwrap().id, a);
        }

        store.remove(a).unwrap();
        assert_eq!(select(&request("GET", "/x"), &store.list()).unwrap().id, b);
    }

    #[test]
    fn test_tie_break_skips_disabled_earlier_route() {
        let store = RouteStore::new();
        let a = store.add(config(RequestMethod::Get, "/x")).unwrap();
        let b = store.add(config(RequestMethod::Get, "/x")).unwrap();

        store.set_enabled(a, false).unwrap();
        assert_eq!(select(&request("GET", "/x"), &store.list()).unwrap().id, b);
    }

    #[test]
    fn test_template_and_exact_tie_break_by_position_not_specificity() {
        let store = RouteStore::new();
        let template = store
            .add(config(RequestMethod::Get, "/api/user/:id"))
            .unwrap();
        let _exact = store
            .add(config(RequestMethod::Get, "/api/user/42"))
            .unwrap();

        // The earlier, less specific template still wins
        assert_eq!(
            select(&request("GET", "/api/user/42"), &store.list())
                .unwrap()
                .id,
            template
        );
    }

    #[test]
    fn test_empty_url_route_never_matches() {
        // Bypass store validation to exercise the defensive guard
        let route = crate::route::Route {
            id: crate::route::RouteId::fresh(),
            request_url: String::new(),
            request_method: RequestMethod::Any,
            response_data: Body::default(),
            response_headers: Headers::new(),
            response_status: 200,
            enabled: true,
        };
        assert!(select(&request("GET", "/x"), &[route]).is_none());
    }
}
