//! The policy table: scope to rule resolution.

use crate::domain::rule::{PolicyRule, RuleError};
use crate::domain::scope::{KeySource, PolicyScope};
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Error returned when a policy table fails validation.
///
/// All variants are startup-time configuration errors; a process should
/// refuse to start rather than serve requests with a broken table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A reachable scope has no rule
    MissingScope(PolicyScope),
    /// A scope appears in more than one rule
    DuplicateScope(PolicyScope),
    /// A rule's parameters are invalid
    InvalidRule(PolicyScope, RuleError),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::MissingScope(scope) => {
                write!(f, "no rule defined for scope '{scope}'")
            }
            TableError::DuplicateScope(scope) => {
                write!(f, "scope '{scope}' has more than one rule")
            }
            TableError::InvalidRule(scope, source) => {
                write!(f, "invalid rule for scope '{scope}': {source}")
            }
        }
    }
}

impl std::error::Error for TableError {}

/// Read-only mapping from every [`PolicyScope`] to its [`PolicyRule`].
///
/// Validated once at construction: every scope covered, no duplicates, all
/// rules well-formed. After that, [`PolicyTable::rule_for`] is a total
/// function; there is no per-request failure path and no implicit
/// unlimited fallback.
///
/// # Example
/// ```
/// use quota_gate::{PolicyScope, PolicyTable};
///
/// let table = PolicyTable::default();
/// let rule = table.rule_for(PolicyScope::Login);
/// assert_eq!(rule.limit, 5);
/// ```
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: [PolicyRule; PolicyScope::COUNT],
}

impl PolicyTable {
    /// Build a table from a rule list, validating coverage.
    ///
    /// # Errors
    /// [`TableError::MissingScope`] if any scope lacks a rule,
    /// [`TableError::DuplicateScope`] if a scope appears twice, and
    /// [`TableError::InvalidRule`] if a rule has a zero limit or window.
    pub fn new(rules: impl IntoIterator<Item = PolicyRule>) -> Result<Self, TableError> {
        let mut slots: [Option<PolicyRule>; PolicyScope::COUNT] = [None; PolicyScope::COUNT];

        for rule in rules {
            rule.validate()
                .map_err(|e| TableError::InvalidRule(rule.scope, e))?;
            let slot = &mut slots[rule.scope.index()];
            if slot.is_some() {
                return Err(TableError::DuplicateScope(rule.scope));
            }
            *slot = Some(rule);
        }

        for scope in PolicyScope::ALL {
            if slots[scope.index()].is_none() {
                return Err(TableError::MissingScope(scope));
            }
        }

        let rules = slots.map(|slot| slot.expect("all scopes verified present"));
        Ok(Self { rules })
    }

    /// Resolve a scope to its rule. Total over the scope set; no side
    /// effects.
    pub fn rule_for(&self, scope: PolicyScope) -> &PolicyRule {
        &self.rules[scope.index()]
    }

    /// All rules, in scope order.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }
}

impl Default for PolicyTable {
    /// The stock policy table.
    ///
    /// Authentication endpoints are keyed by remote address with tight
    /// hourly limits; resource traffic is keyed by principal with per-minute
    /// limits, reads more lenient than writes.
    fn default() -> Self {
        let rule = |scope, limit, window, keyed_by| PolicyRule {
            scope,
            limit,
            window,
            keyed_by,
        };
        Self::new([
            rule(PolicyScope::Login, 5, HOUR, KeySource::PerRemoteAddress),
            rule(PolicyScope::Register, 5, HOUR, KeySource::PerRemoteAddress),
            rule(PolicyScope::TokenRefresh, 10, MINUTE, KeySource::PerPrincipal),
            rule(PolicyScope::Logout, 20, MINUTE, KeySource::PerPrincipal),
            rule(PolicyScope::CurrentUser, 60, MINUTE, KeySource::PerPrincipal),
            rule(PolicyScope::Read, 100, MINUTE, KeySource::PerPrincipal),
            rule(PolicyScope::Write, 20, MINUTE, KeySource::PerPrincipal),
            rule(
                PolicyScope::AnonymousDefault,
                20,
                HOUR,
                KeySource::PerRemoteAddress,
            ),
            rule(
                PolicyScope::AuthenticatedDefault,
                100,
                MINUTE,
                KeySource::PerPrincipal,
            ),
        ])
        .expect("stock policy table is valid")
    }
}
