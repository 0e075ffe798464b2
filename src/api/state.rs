//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::{AuthConfig, AuthGate, CookieCodec};
use crate::oauth::IdentityExchange;
use crate::session::SessionService;
use crate::user::UserService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validated authentication configuration.
    pub config: Arc<AuthConfig>,
    /// Session cookie encoder and extractor.
    pub cookies: Arc<CookieCodec>,
    /// Session lifecycle service.
    pub sessions: Arc<SessionService>,
    /// User account service.
    pub users: Arc<UserService>,
    /// Identity exchange against the OAuth providers.
    pub identity: Arc<dyn IdentityExchange>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: AuthConfig,
        sessions: SessionService,
        users: UserService,
        identity: Arc<dyn IdentityExchange>,
    ) -> Self {
        let cookies = Arc::new(CookieCodec::new(config.cookie.clone()));

        Self {
            config: Arc::new(config),
            cookies,
            sessions: Arc::new(sessions),
            users: Arc::new(users),
            identity,
        }
    }

    /// State for the authentication middleware.
    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(self.sessions.clone(), self.cookies.clone())
    }
}
