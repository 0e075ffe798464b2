//! User roles and role sets.

use serde::{Deserialize, Serialize};

/// A role grantable to a user.
///
/// Stored per user as a set; the wire format is the upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Baseline role every new user receives.
    Community,
    /// Recognized subject-matter expert.
    Expert,
    /// Moderation privileges.
    Moderator,
    /// Full administrative access.
    Admin,
}

impl Role {
    /// All known roles, in declaration order.
    pub const ALL: [Role; 4] = [Role::Community, Role::Expert, Role::Moderator, Role::Admin];

    fn bit(self) -> u8 {
        match self {
            Role::Community => 1 << 0,
            Role::Expert => 1 << 1,
            Role::Moderator => 1 << 2,
            Role::Admin => 1 << 3,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Community => write!(f, "COMMUNITY"),
            Role::Expert => write!(f, "EXPERT"),
            Role::Moderator => write!(f, "MODERATOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COMMUNITY" => Ok(Role::Community),
            "EXPERT" => Ok(Role::Expert),
            "MODERATOR" => Ok(Role::Moderator),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A set of roles, serialized as an array of role names.
///
/// Gate checks use any-of semantics: a user passes when the intersection of
/// their roles with the required set is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(u8);

impl RoleSet {
    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    pub fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// True when `self` and `other` share at least one role.
    pub fn intersects(self, other: RoleSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::default();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        RoleSet(role.bit())
    }
}

impl From<Vec<Role>> for RoleSet {
    fn from(roles: Vec<Role>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.iter().collect()
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for role in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", role)?;
            first = false;
        }
        Ok(())
    }
}
