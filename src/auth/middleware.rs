//! Session authentication and role enforcement middleware.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::ApiError;
use crate::auth::cookie::CookieCodec;
use crate::auth::roles::RoleSet;
use crate::session::{SessionLookup, SessionService};
use crate::user::User;

/// State handed to [`authenticate`].
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<SessionService>,
    cookies: Arc<CookieCodec>,
}

impl AuthGate {
    pub fn new(sessions: Arc<SessionService>, cookies: Arc<CookieCodec>) -> Self {
        Self { sessions, cookies }
    }
}

/// Authenticated user for the current request.
///
/// Injected into request extensions by [`authenticate`]; handlers receive it
/// by declaring it as an extractor parameter.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

/// Extract the authenticated user from request extensions.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Session authentication middleware.
///
/// Resolves the request's session cookie against the store and injects
/// [`CurrentUser`] into request extensions. Requests without a live session
/// are rejected before the handler runs. Storage failures during resolution
/// degrade to the same rejection; the failure is logged where it occurred,
/// never surfaced to the client as a server error.
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = gate.cookies.extract(req.headers()) else {
        return Err(ApiError::Unauthenticated);
    };

    match gate.sessions.resolve_session(&token).await {
        SessionLookup::Authenticated(user) => {
            req.extensions_mut().insert(CurrentUser { user });
            Ok(next.run(req).await)
        }
        SessionLookup::Unauthenticated | SessionLookup::StorageFailure => {
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Role enforcement middleware.
///
/// Must be layered inside [`authenticate`]. Passes when the user holds at
/// least one of the required roles; an empty required set admits any
/// authenticated user.
pub async fn require_roles(
    State(required): State<RoleSet>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ApiError::Unauthenticated)?;

    if !required.is_empty() && !user.user.roles.intersects(required) {
        debug!(user_id = %user.user.id, required = %required, "role gate rejected user");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    use crate::auth::config::CookieConfig;
    use crate::auth::roles::Role;
    use crate::db::Database;
    use crate::session::SessionRepository;
    use crate::user::{UserRepository, UserService};

    struct Harness {
        gate: AuthGate,
        sessions: Arc<SessionService>,
        users: UserService,
    }

    async fn harness() -> Harness {
        let db = Database::in_memory().await.unwrap();
        let sessions = Arc::new(SessionService::new(
            SessionRepository::new(db.pool().clone()),
            UserRepository::new(db.pool().clone()),
            3600,
        ));
        let users = UserService::new(UserRepository::new(db.pool().clone()));
        let cookies = Arc::new(CookieCodec::new(CookieConfig::default()));
        Harness {
            gate: AuthGate::new(sessions.clone(), cookies),
            sessions,
            users,
        }
    }

    async fn whoami(current: CurrentUser) -> String {
        format!("{} [{}]", current.user.id, current.user.roles)
    }

    fn guarded_router(gate: AuthGate, required: RoleSet) -> Router {
        Router::new()
            .route("/guarded", get(whoami))
            .layer(middleware::from_fn_with_state(required, require_roles))
            .layer(middleware::from_fn_with_state(gate, authenticate))
    }

    /// Seed a user with the given extra roles and return a session cookie value.
    async fn login_as(h: &Harness, email: &str, roles: &[Role]) -> (String, String) {
        let user = h
            .users
            .upsert_from_identity(email, Some("tester"), None)
            .await
            .unwrap();
        for role in roles {
            h.users.grant_role(email, *role).await.unwrap();
        }
        let issued = h.sessions.create_session(&user.id, None, None).await.unwrap();
        (user.id, format!("wicket_session={}", issued.token))
    }

    async fn send(router: &Router, cookie: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().uri("/guarded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_no_cookie_is_unauthorized() {
        let h = harness().await;
        let router = guarded_router(h.gate.clone(), RoleSet::from(Role::Admin));

        let (status, body) = send(&router, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHENTICATED"));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let h = harness().await;
        let router = guarded_router(h.gate.clone(), RoleSet::from(Role::Admin));

        let (status, _) = send(&router, Some("wicket_session=feedface")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_role_is_forbidden() {
        let h = harness().await;
        let (_, cookie) = login_as(&h, "member@example.com", &[]).await;
        let router = guarded_router(h.gate.clone(), RoleSet::from(Role::Admin));

        let (status, body) = send(&router, Some(&cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("FORBIDDEN"));
    }

    #[tokio::test]
    async fn test_admin_passes_admin_gate() {
        let h = harness().await;
        let (user_id, cookie) = login_as(&h, "root@example.com", &[Role::Admin]).await;
        let router = guarded_router(h.gate.clone(), RoleSet::from(Role::Admin));

        let (status, body) = send(&router, Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(&user_id));
        assert!(body.contains("ADMIN"));
    }

    #[tokio::test]
    async fn test_any_of_gate_accepts_moderator() {
        let h = harness().await;
        let (_, cookie) = login_as(&h, "mod@example.com", &[Role::Moderator]).await;
        let required: RoleSet = [Role::Admin, Role::Moderator].into_iter().collect();
        let router = guarded_router(h.gate.clone(), required);

        let (status, _) = send(&router, Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_required_set_admits_any_session() {
        let h = harness().await;
        let (_, cookie) = login_as(&h, "member@example.com", &[]).await;
        let router = guarded_router(h.gate.clone(), RoleSet::default());

        let (status, _) = send(&router, Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_revoked_session_is_unauthorized() {
        let h = harness().await;
        let (_, cookie) = login_as(&h, "gone@example.com", &[Role::Admin]).await;
        let router = guarded_router(h.gate.clone(), RoleSet::from(Role::Admin));

        let (status, _) = send(&router, Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);

        let token = cookie.split_once('=').unwrap().1.to_string();
        h.sessions.revoke_session(&token).await.unwrap();

        let (status, _) = send(&router, Some(&cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_rejects() {
        let router = Router::new().route("/guarded", get(whoami));

        let (status, _) = send(&router, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
