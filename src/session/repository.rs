//! Session database repository.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::models::Session;
use crate::db::format_timestamp;

/// Repository for session persistence.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new session row.
    ///
    /// The token is the primary key; a collision violates it and surfaces
    /// as an error rather than silently replacing the row.
    pub async fn create(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at, revoked_at, user_agent, ip)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(&session.created_at)
        .bind(&session.expires_at)
        .bind(&session.revoked_at)
        .bind(&session.user_agent)
        .bind(&session.ip)
        .execute(&self.pool)
        .await
        .context("creating session")?;

        Ok(())
    }

    /// Get a session by token.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, created_at, expires_at, revoked_at, user_agent, ip
            FROM sessions
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("fetching session")?;

        Ok(session)
    }

    /// Mark a session revoked at `at`.
    ///
    /// Returns whether a row transitioned. Unknown or already-revoked
    /// tokens leave the store untouched.
    pub async fn revoke(&self, token: &str, at: DateTime<Utc>) -> Result<bool> {
        let result =
            sqlx::query("UPDATE sessions SET revoked_at = ? WHERE token = ? AND revoked_at IS NULL")
                .bind(format_timestamp(at))
                .bind(token)
                .execute(&self.pool)
                .await
                .context("revoking session")?;

        Ok(result.rows_affected() > 0)
    }

    /// List sessions, newest first, optionally filtered by user.
    pub async fn list(&self, user_id: Option<&str>, limit: i64) -> Result<Vec<Session>> {
        let sessions = if let Some(user_id) = user_id {
            sqlx::query_as::<_, Session>(
                r#"
                SELECT token, user_id, created_at, expires_at, revoked_at, user_agent, ip
                FROM sessions
                WHERE user_id = ?
                ORDER BY created_at DESC
                LIMIT ?
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Session>(
                r#"
                SELECT token, user_id, created_at, expires_at, revoked_at, user_agent, ip
                FROM sessions
                ORDER BY created_at DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .context("listing sessions")?;

        Ok(sessions)
    }

    /// Count the rows `prune` would delete as of `now`.
    pub async fn prunable_count(&self, now: DateTime<Utc>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sessions WHERE revoked_at IS NOT NULL OR expires_at <= ?",
        )
        .bind(format_timestamp(now))
        .fetch_one(&self.pool)
        .await
        .context("counting prunable sessions")?;

        Ok(row.0)
    }

    /// Delete rows that are expired or revoked as of `now`.
    ///
    /// Returns the number of rows removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE revoked_at IS NOT NULL OR expires_at <= ?")
                .bind(format_timestamp(now))
                .execute(&self.pool)
                .await
                .context("pruning sessions")?;

        Ok(result.rows_affected())
    }
}
