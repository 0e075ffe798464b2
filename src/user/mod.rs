//! User management module.
//!
//! Accounts are provisioned by OAuth sign-in and carry a set of roles
//! checked by the RBAC gate.

mod models;
mod repository;
mod service;

pub use models::{User, UserProfile};
pub use repository::UserRepository;
pub use service::UserService;
