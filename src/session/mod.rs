//! Session management module.
//!
//! Handles the lifecycle of bearer sessions: issuance after OAuth sign-in,
//! per-request resolution, and revocation.

mod models;
mod repository;
mod service;

pub use models::{IssuedSession, Session};
pub use repository::SessionRepository;
pub use service::{SessionLookup, SessionService};
