//! Static route-to-scope mapping.
//!
//! Scope selection is table-driven and fixed at startup: each named route
//! maps to either a fixed scope or a read/write split on the HTTP method.
//! Requests matching no entry fall back to the anonymous or authenticated
//! default scope. Keeping the mapping as data makes the policy testable
//! without any web framework in the loop.

use crate::domain::scope::PolicyScope;
use ahash::RandomState;
use std::collections::HashMap;

/// HTTP request methods, as far as scope selection cares about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether the method is safe (read-only) per RFC 9110.
    pub fn is_safe(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Options)
    }
}

/// How a route resolves to a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSelector {
    /// The route always uses one scope (e.g. the login endpoint).
    Fixed(PolicyScope),
    /// Safe methods use [`PolicyScope::Read`], the rest
    /// [`PolicyScope::Write`] (the usual resource endpoint split).
    ByMethod,
}

/// The static mapping from route names to scope selectors.
///
/// # Example
/// ```
/// use quota_gate::{HttpMethod, PolicyScope, RouteMap, ScopeSelector};
///
/// let mut routes = RouteMap::new();
/// routes.insert("auth/login", ScopeSelector::Fixed(PolicyScope::Login));
/// routes.insert("products", ScopeSelector::ByMethod);
///
/// let scope = routes.scope_for("products", HttpMethod::Get, true);
/// assert_eq!(scope, PolicyScope::Read);
///
/// // Unmapped routes fall back by authentication state.
/// let scope = routes.scope_for("unknown", HttpMethod::Get, false);
/// assert_eq!(scope, PolicyScope::AnonymousDefault);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteMap {
    entries: HashMap<String, ScopeSelector, RandomState>,
}

impl RouteMap {
    /// Create an empty route map (every request falls back to a default
    /// scope).
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a route name to a selector. Replaces any previous entry.
    pub fn insert(&mut self, route: impl Into<String>, selector: ScopeSelector) {
        self.entries.insert(route.into(), selector);
    }

    /// Builder-style [`RouteMap::insert`].
    pub fn with_route(mut self, route: impl Into<String>, selector: ScopeSelector) -> Self {
        self.insert(route, selector);
        self
    }

    /// The mapping used by the stock API surface: authentication endpoints
    /// on fixed scopes, everything else resolved per method.
    pub fn standard() -> Self {
        Self::new()
            .with_route("auth/login", ScopeSelector::Fixed(PolicyScope::Login))
            .with_route("auth/register", ScopeSelector::Fixed(PolicyScope::Register))
            .with_route(
                "auth/refresh",
                ScopeSelector::Fixed(PolicyScope::TokenRefresh),
            )
            .with_route("auth/logout", ScopeSelector::Fixed(PolicyScope::Logout))
            .with_route("auth/me", ScopeSelector::Fixed(PolicyScope::CurrentUser))
    }

    /// Number of mapped routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no routes are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the scope for one request.
    ///
    /// Mapped routes use their selector; unmapped routes fall back to
    /// [`PolicyScope::AuthenticatedDefault`] or
    /// [`PolicyScope::AnonymousDefault`] by authentication state.
    pub fn scope_for(&self, route: &str, method: HttpMethod, authenticated: bool) -> PolicyScope {
        match self.entries.get(route) {
            Some(ScopeSelector::Fixed(scope)) => *scope,
            Some(ScopeSelector::ByMethod) => {
                if method.is_safe() {
                    PolicyScope::Read
                } else {
                    PolicyScope::Write
                }
            }
            None => {
                if authenticated {
                    PolicyScope::AuthenticatedDefault
                } else {
                    PolicyScope::AnonymousDefault
                }
            }
        }
    }
}
