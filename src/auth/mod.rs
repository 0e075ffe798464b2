//! Authentication module.
//!
//! Covers the pieces between a browser and a user record:
//! - session cookie encoding and extraction
//! - the authentication and role-gate middleware
//! - role and auth configuration types

mod config;
mod cookie;
mod middleware;
mod roles;

pub use config::{
    AuthConfig, ConfigValidationError, CookieConfig, ProviderCredentials, SameSite,
};
pub use cookie::CookieCodec;
pub use middleware::{AuthGate, CurrentUser, authenticate, require_roles};
pub use roles::{Role, RoleSet};
