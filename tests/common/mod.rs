//! Test utilities and common setup.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use wicket::api::{self, AppState};
use wicket::auth::{AuthConfig, Role};
use wicket::db::Database;
use wicket::oauth::{Identity, IdentityExchange, OAuthClient, Provider};
use wicket::session::{SessionRepository, SessionService};
use wicket::user::{UserRepository, UserService};

/// Auth config with test origins. No real provider credentials; the
/// identity exchange is stubbed out instead.
fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.app_origin = "http://app.test".to_string();
    config.api_origin = "http://api.test".to_string();
    config
}

/// Identity returned by the stub exchange for successful logins.
pub fn stub_identity() -> Identity {
    Identity {
        email: "ada@example.com".to_string(),
        name: Some("Ada".to_string()),
        avatar_url: Some("https://cdn.test/ada.png".to_string()),
    }
}

/// Identity exchange stub. `identity: None` makes every code exchange fail
/// the way a provider rejecting the code would.
pub struct StubExchange {
    pub identity: Option<Identity>,
}

#[async_trait]
impl IdentityExchange for StubExchange {
    fn authorize_url(&self, provider: Provider, state: &str) -> Option<String> {
        Some(format!(
            "https://id.test/{}/authorize?state={}",
            provider, state
        ))
    }

    async fn exchange_code(&self, _provider: Provider, _code: &str) -> Result<Identity> {
        match self.identity {
            Some(ref identity) => Ok(identity.clone()),
            None => Err(anyhow::anyhow!("provider rejected the code")),
        }
    }
}

/// A router under test plus service handles for seeding state directly.
/// The database handle lets tests close the pool to simulate storage loss.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub sessions: SessionService,
    pub users: UserService,
}

impl TestApp {
    /// Provision a user with these extra roles and open a session for them.
    /// Returns the user ID and a ready-to-send Cookie header value.
    pub async fn login(&self, email: &str, roles: &[Role]) -> (String, String) {
        let user = self
            .users
            .upsert_from_identity(email, Some("Test User"), None)
            .await
            .unwrap();
        for role in roles {
            self.users.grant_role(email, *role).await.unwrap();
        }

        let issued = self
            .sessions
            .create_session(&user.id, None, None)
            .await
            .unwrap();

        (user.id, format!("wicket_session={}", issued.token))
    }
}

async fn build_app(identity_exchange: Arc<dyn IdentityExchange>) -> TestApp {
    // Use in-memory database for tests
    let db = Database::in_memory().await.unwrap();
    let config = test_auth_config();

    let session_repo = SessionRepository::new(db.pool().clone());
    let user_repo = UserRepository::new(db.pool().clone());
    let session_service =
        SessionService::new(session_repo, user_repo.clone(), config.session_ttl_secs);
    let user_service = UserService::new(user_repo);

    let state = AppState::new(
        config,
        session_service.clone(),
        user_service.clone(),
        identity_exchange,
    );

    TestApp {
        router: api::create_router(state),
        db,
        sessions: session_service,
        users: user_service,
    }
}

/// Create a test application whose code exchange yields [`stub_identity`].
pub async fn test_app() -> TestApp {
    test_app_with_exchange(Some(stub_identity())).await
}

/// Create a test application with a configurable stub exchange.
pub async fn test_app_with_exchange(identity: Option<Identity>) -> TestApp {
    build_app(Arc::new(StubExchange { identity })).await
}

/// Create a test application backed by the real OAuth client with no
/// provider credentials configured.
pub async fn test_app_without_providers() -> TestApp {
    build_app(Arc::new(OAuthClient::new(test_auth_config()))).await
}
