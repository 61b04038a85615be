//! Principals: the identities quotas are tracked against.

use crate::domain::scope::{KeySource, PolicyScope};

/// The identity a quota counter is tracked against.
///
/// Either a stable authenticated user identifier or, for anonymous callers,
/// the remote network address. Two principals with byte-equal identifiers
/// share a counter within a scope; the counter key carries only the
/// identifier string, so the variant never splits a quota.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// An authenticated user, identified by a stable unique id.
    User(String),
    /// An anonymous caller, identified by network address.
    RemoteAddr(String),
}

impl Principal {
    /// The identifier string this principal is keyed by.
    pub fn id(&self) -> &str {
        match self {
            Principal::User(id) => id,
            Principal::RemoteAddr(addr) => addr,
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// The identity material an HTTP pipeline extracts per request.
///
/// The pipeline resolves who is calling (if anyone) and from where; the
/// rule's [`KeySource`] then decides which of the two identities the quota
/// is tracked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// Authenticated user identifier, when present
    pub user_id: Option<String>,
    /// Caller's network address
    pub remote_addr: String,
}

impl RequestIdentity {
    /// Identity for an authenticated request.
    pub fn authenticated(user_id: impl Into<String>, remote_addr: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            remote_addr: remote_addr.into(),
        }
    }

    /// Identity for an anonymous request.
    pub fn anonymous(remote_addr: impl Into<String>) -> Self {
        Self {
            user_id: None,
            remote_addr: remote_addr.into(),
        }
    }

    /// Whether a user identifier is present.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Select the principal for a rule's key source.
    ///
    /// `PerRemoteAddress` always keys by address. `PerPrincipal` keys by the
    /// user identifier, falling back to the remote address when the caller
    /// is unauthenticated so anonymous traffic on principal-keyed scopes is
    /// still metered.
    pub fn principal_for(&self, keyed_by: KeySource) -> Principal {
        match keyed_by {
            KeySource::PerRemoteAddress => Principal::RemoteAddr(self.remote_addr.clone()),
            KeySource::PerPrincipal => match &self.user_id {
                Some(id) => Principal::User(id.clone()),
                None => Principal::RemoteAddr(self.remote_addr.clone()),
            },
        }
    }
}

/// Storage key for one quota counter: (principal identifier, scope).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuotaKey {
    principal: String,
    scope: PolicyScope,
}

impl QuotaKey {
    /// Build the key for a principal within a scope.
    pub fn new(principal: &Principal, scope: PolicyScope) -> Self {
        Self {
            principal: principal.id().to_string(),
            scope,
        }
    }

    /// The principal identifier component.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// The scope component.
    pub fn scope(&self) -> PolicyScope {
        self.scope
    }
}
