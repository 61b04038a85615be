//! Policy scopes: the named operation classes that carry independent quotas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class of operation subject to its own quota.
///
/// Scopes form a closed set: every scope reachable at runtime has exactly one
/// rule in the [`PolicyTable`](crate::application::table::PolicyTable), and an
/// incomplete table is rejected at construction time. The two `*Default`
/// scopes are the only fallbacks for requests that match no explicit route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyScope {
    /// Login attempts (brute-force protection)
    Login,
    /// Account registration attempts
    Register,
    /// Access-token refresh requests
    TokenRefresh,
    /// Logout / token revocation requests
    Logout,
    /// "Who am I" profile lookups
    CurrentUser,
    /// Safe (read-only) resource operations
    Read,
    /// Mutating resource operations
    Write,
    /// Fallback for unmatched anonymous requests
    AnonymousDefault,
    /// Fallback for unmatched authenticated requests
    AuthenticatedDefault,
}

impl PolicyScope {
    /// Every scope, in table order.
    ///
    /// Used by [`PolicyTable`](crate::application::table::PolicyTable) to
    /// verify coverage at startup.
    pub const ALL: [PolicyScope; 9] = [
        PolicyScope::Login,
        PolicyScope::Register,
        PolicyScope::TokenRefresh,
        PolicyScope::Logout,
        PolicyScope::CurrentUser,
        PolicyScope::Read,
        PolicyScope::Write,
        PolicyScope::AnonymousDefault,
        PolicyScope::AuthenticatedDefault,
    ];

    /// Number of scopes in the closed set.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyScope::Login => "login",
            PolicyScope::Register => "register",
            PolicyScope::TokenRefresh => "token_refresh",
            PolicyScope::Logout => "logout",
            PolicyScope::CurrentUser => "current_user",
            PolicyScope::Read => "read",
            PolicyScope::Write => "write",
            PolicyScope::AnonymousDefault => "anonymous_default",
            PolicyScope::AuthenticatedDefault => "authenticated_default",
        }
    }

    /// Dense index for array-backed lookup tables, matching `ALL` order.
    pub(crate) fn index(&self) -> usize {
        match self {
            PolicyScope::Login => 0,
            PolicyScope::Register => 1,
            PolicyScope::TokenRefresh => 2,
            PolicyScope::Logout => 3,
            PolicyScope::CurrentUser => 4,
            PolicyScope::Read => 5,
            PolicyScope::Write => 6,
            PolicyScope::AnonymousDefault => 7,
            PolicyScope::AuthenticatedDefault => 8,
        }
    }
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which identity a scope's quota is tracked against.
///
/// Authentication endpoints key by remote address (an attacker without
/// credentials has no principal), resource endpoints key by principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// Track against the authenticated user identifier.
    PerPrincipal,
    /// Track against the caller's network address.
    PerRemoteAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_scope_once() {
        let mut seen = std::collections::BTreeSet::new();
        for scope in PolicyScope::ALL {
            assert!(seen.insert(scope), "duplicate scope {scope} in ALL");
        }
        assert_eq!(seen.len(), PolicyScope::COUNT);
    }

    #[test]
    fn test_index_is_dense_and_stable() {
        for (i, scope) in PolicyScope::ALL.iter().enumerate() {
            assert_eq!(scope.index(), i);
        }
    }

    #[test]
    fn test_display_matches_serde_form() {
        let json = serde_json::to_string(&PolicyScope::TokenRefresh).unwrap();
        assert_eq!(json, "\"token_refresh\"");
        assert_eq!(PolicyScope::TokenRefresh.to_string(), "token_refresh");

        let parsed: PolicyScope = serde_json::from_str("\"anonymous_default\"").unwrap();
        assert_eq!(parsed, PolicyScope::AnonymousDefault);
    }

    #[test]
    fn test_key_source_serde() {
        let json = serde_json::to_string(&KeySource::PerRemoteAddress).unwrap();
        assert_eq!(json, "\"per_remote_address\"");
    }
}
