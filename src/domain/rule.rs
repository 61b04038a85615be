//! Per-scope quota rules.

use crate::domain::scope::{KeySource, PolicyScope};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error returned when a rule's parameters are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Limit must be greater than zero
    ZeroLimit,
    /// Window must be greater than zero
    ZeroWindow,
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleError::ZeroLimit => write!(f, "limit must be greater than 0"),
            RuleError::ZeroWindow => write!(f, "window must be greater than 0"),
        }
    }
}

impl std::error::Error for RuleError {}

/// Immutable quota configuration for one scope.
///
/// Rules are loaded once at process start and never mutated afterwards.
/// A rule admits at most `limit` requests per `window` per key, where the
/// key identity is chosen by `keyed_by`.
///
/// # Example
/// ```
/// use quota_gate::{KeySource, PolicyRule, PolicyScope};
/// use std::time::Duration;
///
/// let rule = PolicyRule::new(
///     PolicyScope::Login,
///     5,
///     Duration::from_secs(3600),
///     KeySource::PerRemoteAddress,
/// )
/// .unwrap();
/// assert_eq!(rule.limit, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// The scope this rule governs
    pub scope: PolicyScope,
    /// Maximum admitted requests per window
    pub limit: u32,
    /// Window length; the counter resets entirely at window boundaries
    pub window: Duration,
    /// Identity the quota is tracked against
    pub keyed_by: KeySource,
}

impl PolicyRule {
    /// Create a rule, validating its parameters.
    ///
    /// # Errors
    /// Returns [`RuleError::ZeroLimit`] or [`RuleError::ZeroWindow`] for
    /// non-positive parameters. These are configuration errors; a process
    /// should refuse to start rather than run with a degenerate rule.
    pub fn new(
        scope: PolicyScope,
        limit: u32,
        window: Duration,
        keyed_by: KeySource,
    ) -> Result<Self, RuleError> {
        if limit == 0 {
            return Err(RuleError::ZeroLimit);
        }
        if window.is_zero() {
            return Err(RuleError::ZeroWindow);
        }
        Ok(Self {
            scope,
            limit,
            window,
            keyed_by,
        })
    }

    /// Validate an already-constructed rule (e.g. one deserialized from
    /// configuration, which bypasses [`PolicyRule::new`]).
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.limit == 0 {
            return Err(RuleError::ZeroLimit);
        }
        if self.window.is_zero() {
            return Err(RuleError::ZeroWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rule() {
        let rule = PolicyRule::new(
            PolicyScope::Read,
            100,
            Duration::from_secs(60),
            KeySource::PerPrincipal,
        )
        .unwrap();
        assert_eq!(rule.scope, PolicyScope::Read);
        assert_eq!(rule.limit, 100);
        assert_eq!(rule.window, Duration::from_secs(60));
        assert_eq!(rule.keyed_by, KeySource::PerPrincipal);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = PolicyRule::new(
            PolicyScope::Write,
            0,
            Duration::from_secs(60),
            KeySource::PerPrincipal,
        );
        assert_eq!(result, Err(RuleError::ZeroLimit));
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = PolicyRule::new(
            PolicyScope::Write,
            20,
            Duration::ZERO,
            KeySource::PerPrincipal,
        );
        assert_eq!(result, Err(RuleError::ZeroWindow));
    }

    #[test]
    fn test_deserialized_rule_validates() {
        let json = r#"{
            "scope": "login",
            "limit": 0,
            "window": { "secs": 3600, "nanos": 0 },
            "keyed_by": "per_remote_address"
        }"#;
        let rule: PolicyRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.validate(), Err(RuleError::ZeroLimit));
    }
}
