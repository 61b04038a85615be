//! Boundary rendering: rate-limit headers and the throttled-response body.
//!
//! The engine itself never touches HTTP; these helpers turn a
//! [`Decision`](crate::domain::decision::Decision) into the header values
//! and deny body an HTTP layer attaches. They are plain data so any server
//! stack can consume them.

use crate::domain::decision::Decision;
use serde_json::json;
use std::time::SystemTime;

/// Standard rate-limit response headers.
pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
/// Remaining-quota header name.
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
/// Window-reset header name (Unix seconds).
pub const HEADER_RESET: &str = "X-RateLimit-Reset";
/// Retry hint header name, attached to denials only.
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// Header values describing a quota decision.
///
/// The `X-RateLimit-*` trio is attached to every response, admitted or
/// denied, so clients can pace themselves before hitting the limit.
/// `Retry-After` is carried on denials only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// The rule's limit
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Window reset time as Unix seconds
    pub reset: u64,
    /// Seconds until retry is worthwhile; denials only
    pub retry_after: Option<u64>,
}

impl RateLimitHeaders {
    /// Build the header trio from a decision and its rule's limit.
    pub fn from_decision(limit: u32, decision: &Decision) -> Self {
        Self {
            limit,
            remaining: decision.remaining,
            reset: decision.reset_at_unix(),
            retry_after: None,
        }
    }

    /// Build headers for a denial, including the `Retry-After` hint
    /// computed against the caller's `now`.
    pub fn for_denial(limit: u32, decision: &Decision, now: SystemTime) -> Self {
        Self {
            retry_after: Some(decision.retry_after(now).as_secs()),
            ..Self::from_decision(limit, decision)
        }
    }

    /// Render as (name, value) pairs ready for a header map.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (HEADER_LIMIT, self.limit.to_string()),
            (HEADER_REMAINING, self.remaining.to_string()),
            (HEADER_RESET, self.reset.to_string()),
        ];
        if let Some(retry_after) = self.retry_after {
            pairs.push((HEADER_RETRY_AFTER, retry_after.to_string()));
        }
        pairs
    }
}

/// The JSON body for a denied (HTTP 429) response.
///
/// Matches the wire format of the modeled API:
/// `{"detail": "Request was throttled. Expected available in 58 seconds."}`
pub fn throttled_body(decision: &Decision, now: SystemTime) -> String {
    let wait = decision.retry_after(now).as_secs();
    json!({
        "detail": format!("Request was throttled. Expected available in {wait} seconds.")
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_headers_from_decision() {
        let decision = Decision {
            allowed: true,
            remaining: 42,
            reset_at: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        };
        let headers = RateLimitHeaders::from_decision(100, &decision);

        assert_eq!(
            headers.to_pairs(),
            vec![
                ("X-RateLimit-Limit", "100".to_string()),
                ("X-RateLimit-Remaining", "42".to_string()),
                ("X-RateLimit-Reset", "1700000000".to_string()),
            ]
        );
    }

    #[test]
    fn test_denial_headers_include_retry_after() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        let decision = Decision {
            allowed: false,
            remaining: 0,
            reset_at: now + Duration::from_secs(58),
        };
        let headers = RateLimitHeaders::for_denial(5, &decision, now);

        assert_eq!(headers.retry_after, Some(58));
        let pairs = headers.to_pairs();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[3], ("Retry-After", "58".to_string()));
    }

    #[test]
    fn test_throttled_body_format() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        let decision = Decision {
            allowed: false,
            remaining: 0,
            reset_at: now + Duration::from_secs(58),
        };

        let body = throttled_body(&decision, now);
        assert_eq!(
            body,
            r#"{"detail":"Request was throttled. Expected available in 58 seconds."}"#
        );
    }

    #[test]
    fn test_throttled_body_clamps_past_reset() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        let decision = Decision {
            allowed: false,
            remaining: 0,
            reset_at: now - Duration::from_secs(10),
        };

        let body = throttled_body(&decision, now);
        assert!(body.contains("in 0 seconds"));
    }
}
