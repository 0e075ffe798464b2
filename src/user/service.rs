//! User service for account provisioning and role administration.

use anyhow::Result;
use tracing::{debug, info, instrument};

use super::models::User;
use super::repository::UserRepository;
use crate::auth::Role;

/// Service for user operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Provision or refresh an account from a verified OAuth identity.
    ///
    /// Accounts are keyed by email. Profile fields mirror whatever the
    /// provider reported, including cleared ones; new accounts start with
    /// the COMMUNITY role.
    #[instrument(skip(self, username, avatar_url))]
    pub async fn upsert_from_identity(
        &self,
        email: &str,
        username: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        let (user, created) = self
            .repo
            .upsert_by_email(email, username, avatar_url, Role::Community)
            .await?;

        if created {
            info!(user_id = %user.id, "created user from OAuth identity");
        } else {
            debug!(user_id = %user.id, "refreshed user profile from OAuth identity");
        }

        Ok(user)
    }

    /// List users, newest first.
    pub async fn list(&self, limit: i64) -> Result<Vec<User>> {
        self.repo.list(limit).await
    }

    /// Grant a role to the user with this email.
    #[instrument(skip(self))]
    pub async fn grant_role(&self, email: &str, role: Role) -> Result<User> {
        let user = self
            .repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No user with email: {}", email))?;

        if self.repo.grant_role(&user.id, role).await? {
            info!(user_id = %user.id, role = %role, "granted role");
        }

        self.repo
            .get(&user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after role grant"))
    }

    /// Revoke a role from the user with this email.
    #[instrument(skip(self))]
    pub async fn revoke_role(&self, email: &str, role: Role) -> Result<User> {
        let user = self
            .repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No user with email: {}", email))?;

        if self.repo.revoke_role(&user.id, role).await? {
            info!(user_id = %user.id, role = %role, "revoked role");
        }

        self.repo
            .get(&user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after role revoke"))
    }
}
