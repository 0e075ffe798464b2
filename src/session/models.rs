//! Session data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::parse_timestamp;

/// A bearer session row.
///
/// Timestamps are RFC 3339 UTC text. Rows are append-only: revocation sets
/// `revoked_at`, and nothing in the request path deletes them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque bearer token, also the primary key. Never reused.
    pub token: String,
    /// Owning user.
    pub user_id: String,
    /// When the session was issued.
    pub created_at: String,
    /// Expiry instant. The session is invalid from this instant on.
    pub expires_at: String,
    /// Set once the session has been explicitly revoked.
    pub revoked_at: Option<String>,
    /// User-Agent captured at issuance (audit only).
    pub user_agent: Option<String>,
    /// Client IP captured at issuance (audit only).
    pub ip: Option<String>,
}

impl Session {
    /// Whether the session is valid at `now`: not revoked and strictly
    /// before expiry. An expiry that fails to parse counts as invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.revoked_at.is_some() {
            return false;
        }
        match parse_timestamp(&self.expires_at) {
            Some(expires) => now < expires,
            None => false,
        }
    }
}

/// A freshly minted session, carrying the parsed expiry for cookie encoding.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::format_timestamp;
    use chrono::Duration;

    fn session(expires_at: String, revoked_at: Option<String>) -> Session {
        Session {
            token: "tok".to_string(),
            user_id: "usr_1".to_string(),
            created_at: format_timestamp(Utc::now()),
            expires_at,
            revoked_at,
            user_agent: None,
            ip: None,
        }
    }

    #[test]
    fn test_valid_before_expiry() {
        let now = Utc::now();
        let s = session(format_timestamp(now + Duration::hours(1)), None);
        assert!(s.is_valid_at(now));
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let now = Utc::now();
        let s = session(format_timestamp(now), None);
        assert!(!s.is_valid_at(now));

        // One microsecond before expiry is still valid.
        assert!(s.is_valid_at(now - Duration::microseconds(1)));
    }

    #[test]
    fn test_revoked_is_invalid_despite_future_expiry() {
        let now = Utc::now();
        let s = session(
            format_timestamp(now + Duration::hours(1)),
            Some(format_timestamp(now)),
        );
        assert!(!s.is_valid_at(now));
    }

    #[test]
    fn test_malformed_expiry_is_invalid() {
        let s = session("not-a-timestamp".to_string(), None);
        assert!(!s.is_valid_at(Utc::now()));
    }
}
