//! User repository for database operations.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{instrument, warn};

use super::models::User;
use crate::auth::{Role, RoleSet};
use crate::db::format_timestamp;

/// Flat `users` row before role hydration.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    username: Option<String>,
    avatar_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_user(self, roles: RoleSet) -> User {
        User {
            id: self.id,
            email: self.email,
            username: self.username,
            avatar_url: self.avatar_url,
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate a new user ID.
    fn generate_id() -> String {
        format!("usr_{}", nanoid::nanoid!(12))
    }

    /// Get a user by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, avatar_url, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Get a user by email.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, avatar_url, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Upsert a user keyed by email.
    ///
    /// An existing account gets its `username` and `avatar_url` overwritten
    /// with the given values (roles untouched); a new account is created
    /// with `default_role`. Returns the user and whether it was created.
    #[instrument(skip(self, username, avatar_url))]
    pub async fn upsert_by_email(
        &self,
        email: &str,
        username: Option<&str>,
        avatar_url: Option<&str>,
        default_role: Role,
    ) -> Result<(User, bool)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin upsert transaction")?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to look up user by email")?;

        let now = format_timestamp(Utc::now());
        let (id, created) = match existing {
            Some((id,)) => {
                sqlx::query(
                    "UPDATE users SET username = ?, avatar_url = ?, updated_at = ? WHERE id = ?",
                )
                .bind(username)
                .bind(avatar_url)
                .bind(&now)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .context("Failed to update user profile")?;

                (id, false)
            }
            None => {
                let id = Self::generate_id();
                sqlx::query(
                    r#"
                    INSERT INTO users (id, email, username, avatar_url, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(email)
                .bind(username)
                .bind(avatar_url)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .context("Failed to insert user")?;

                sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
                    .bind(&id)
                    .bind(default_role.to_string())
                    .execute(&mut *tx)
                    .await
                    .context("Failed to assign default role")?;

                (id, true)
            }
        };

        tx.commit().await.context("Failed to commit upsert")?;

        let user = self
            .get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after upsert"))?;

        Ok((user, created))
    }

    /// List users, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, avatar_url, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }
        Ok(users)
    }

    /// Grant a role. Returns false when the user already held it.
    #[instrument(skip(self))]
    pub async fn grant_role(&self, user_id: &str, role: Role) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to grant role")?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke a role. Returns false when the user did not hold it.
    #[instrument(skip(self))]
    pub async fn revoke_role(&self, user_id: &str, role: Role) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role = ?")
            .bind(user_id)
            .bind(role.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to revoke role")?;

        Ok(result.rows_affected() > 0)
    }

    async fn hydrate(&self, row: UserRow) -> Result<User> {
        let roles = self.load_roles(&row.id).await?;
        Ok(row.into_user(roles))
    }

    /// Load the role set for a user, skipping role names the enum does not
    /// know.
    async fn load_roles(&self, user_id: &str) -> Result<RoleSet> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch user roles")?;

        let mut roles = RoleSet::default();
        for (raw,) in rows {
            match Role::from_str(&raw) {
                Ok(role) => roles.insert(role),
                Err(_) => warn!(user_id = %user_id, role = %raw, "Skipping unknown role"),
            }
        }
        Ok(roles)
    }
}
