//! Session service - issuance, resolution and revocation.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::models::{IssuedSession, Session};
use super::repository::SessionRepository;
use crate::db::format_timestamp;
use crate::user::{User, UserRepository};

/// Outcome of resolving a bearer token.
///
/// Callers decide how to degrade: the RBAC gate turns everything but
/// `Authenticated` into a 401, the `/api/me` handler into a null user.
#[derive(Debug)]
pub enum SessionLookup {
    /// Token maps to a live session owned by this user.
    Authenticated(User),
    /// Unknown, expired or revoked token.
    Unauthenticated,
    /// The backing store failed. Already logged by the service.
    StorageFailure,
}

/// Service for the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionService {
    sessions: SessionRepository,
    users: UserRepository,
    ttl: Duration,
}

impl SessionService {
    /// Create a new session service with the configured lifetime.
    pub fn new(sessions: SessionRepository, users: UserRepository, ttl_secs: i64) -> Self {
        Self {
            sessions,
            users,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Mint a session for `user_id`.
    ///
    /// `user_agent` and `ip` are recorded for audit only. A token collision
    /// surfaces as an error from the insert; tokens are never reissued.
    #[instrument(skip(self, user_agent, ip))]
    pub async fn create_session(
        &self,
        user_id: &str,
        user_agent: Option<String>,
        ip: Option<String>,
    ) -> Result<IssuedSession> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let session = Session {
            token: generate_token(),
            user_id: user_id.to_string(),
            created_at: format_timestamp(now),
            expires_at: format_timestamp(expires_at),
            revoked_at: None,
            user_agent,
            ip,
        };

        self.sessions
            .create(&session)
            .await
            .context("persisting new session")?;

        info!(user_id = %user_id, expires_at = %session.expires_at, "issued session");

        Ok(IssuedSession {
            token: session.token,
            expires_at,
        })
    }

    /// Resolve a bearer token to its owning user.
    ///
    /// Never fails: storage errors on this read path are logged and mapped
    /// to [`SessionLookup::StorageFailure`].
    pub async fn resolve_session(&self, token: &str) -> SessionLookup {
        match self.lookup(token).await {
            Ok(Some(user)) => SessionLookup::Authenticated(user),
            Ok(None) => SessionLookup::Unauthenticated,
            Err(err) => {
                error!(error = ?err, "session resolution hit storage failure");
                SessionLookup::StorageFailure
            }
        }
    }

    async fn lookup(&self, token: &str) -> Result<Option<User>> {
        let Some(session) = self.sessions.find_by_token(token).await? else {
            return Ok(None);
        };

        if !session.is_valid_at(Utc::now()) {
            return Ok(None);
        }

        let user = self.users.get(&session.user_id).await?;
        if user.is_none() {
            warn!(user_id = %session.user_id, "valid session references missing user");
        }

        Ok(user)
    }

    /// Revoke a session.
    ///
    /// Unknown or already-revoked tokens are a no-op; revocation never
    /// un-revokes or shifts an earlier revocation time.
    #[instrument(skip(self, token))]
    pub async fn revoke_session(&self, token: &str) -> Result<()> {
        let revoked = self.sessions.revoke(token, Utc::now()).await?;
        if revoked {
            info!("session revoked");
        }
        Ok(())
    }

    /// List sessions, newest first, optionally filtered by user.
    pub async fn list_sessions(&self, user_id: Option<&str>, limit: i64) -> Result<Vec<Session>> {
        self.sessions.list(user_id, limit).await
    }
}

/// Mint an opaque bearer token: two independent v4 UUIDs joined by a dot.
fn generate_token() -> String {
    format!("{}.{}", Uuid::new_v4(), Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> (SessionService, UserRepository, SessionRepository) {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let sessions = SessionRepository::new(db.pool().clone());
        let service = SessionService::new(sessions.clone(), users.clone(), 3600);
        (service, users, sessions)
    }

    async fn seed_user(users: &UserRepository, email: &str) -> User {
        let (user, _) = users
            .upsert_by_email(email, Some("Test"), None, crate::auth::Role::Community)
            .await
            .unwrap();
        user
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        let (left, right) = token.split_once('.').unwrap();
        assert!(Uuid::parse_str(left).is_ok());
        assert!(Uuid::parse_str(right).is_ok());
        assert_ne!(generate_token(), token);
    }

    #[tokio::test]
    async fn test_create_then_resolve() {
        let (service, users, _) = setup().await;
        let user = seed_user(&users, "ada@example.com").await;

        let issued = service
            .create_session(&user.id, Some("agent".to_string()), None)
            .await
            .unwrap();

        let elapsed = issued.expires_at - Utc::now();
        assert!(elapsed > Duration::seconds(3590) && elapsed <= Duration::seconds(3600));

        match service.resolve_session(&issued.token).await {
            SessionLookup::Authenticated(resolved) => {
                assert_eq!(resolved.id, user.id);
                assert_eq!(resolved.email, "ada@example.com");
            }
            other => panic!("expected authenticated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.resolve_session("never-issued").await,
            SessionLookup::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn test_revoke_then_resolve() {
        let (service, users, _) = setup().await;
        let user = seed_user(&users, "ada@example.com").await;
        let issued = service.create_session(&user.id, None, None).await.unwrap();

        service.revoke_session(&issued.token).await.unwrap();
        assert!(matches!(
            service.resolve_session(&issued.token).await,
            SessionLookup::Unauthenticated
        ));

        // Revoking again, or revoking garbage, stays Ok.
        service.revoke_session(&issued.token).await.unwrap();
        service.revoke_session("never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthenticated() {
        let (service, users, sessions) = setup().await;
        let user = seed_user(&users, "ada@example.com").await;

        let now = Utc::now();
        let expired = Session {
            token: "expired-token".to_string(),
            user_id: user.id.clone(),
            created_at: format_timestamp(now - Duration::hours(2)),
            expires_at: format_timestamp(now - Duration::seconds(1)),
            revoked_at: None,
            user_agent: None,
            ip: None,
        };
        sessions.create(&expired).await.unwrap();

        assert!(matches!(
            service.resolve_session("expired-token").await,
            SessionLookup::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_resolution() {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let sessions = SessionRepository::new(db.pool().clone());
        let service = SessionService::new(sessions, users, 3600);

        db.pool().close().await;

        assert!(matches!(
            service.resolve_session("any-token").await,
            SessionLookup::StorageFailure
        ));
    }
}
