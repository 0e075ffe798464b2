//! User data models.

use serde::{Deserialize, Serialize};

use crate::auth::RoleSet;

/// A user account.
///
/// Roles live in the `user_roles` table and are hydrated with the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// Email address, unique across accounts. OAuth identities are matched
    /// on it.
    pub email: String,
    /// Display name, mirrored from the identity provider.
    pub username: Option<String>,
    /// Avatar URL, mirrored from the identity provider.
    pub avatar_url: Option<String>,
    /// Granted roles.
    pub roles: RoleSet,
    /// When the account was created.
    pub created_at: String,
    /// When the profile was last written.
    pub updated_at: String,
}

/// Public projection of a user for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub roles: RoleSet,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            avatar_url: user.avatar_url,
            roles: user.roles,
        }
    }
}
