//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{Role, RoleSet, authenticate, require_roles};

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state);

    // Tracing layer with request IDs and timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let gate = state.auth_gate();

    // Admin routes (require an authenticated ADMIN session)
    let admin_routes = Router::new()
        .route("/api/admin/ping", get(handlers::admin_ping))
        .route("/api/admin/sessions", get(handlers::admin_list_sessions))
        .route(
            "/api/admin/sessions/{token}/revoke",
            post(handlers::admin_revoke_session),
        )
        .layer(middleware::from_fn_with_state(
            RoleSet::from(Role::Admin),
            require_roles,
        ))
        .layer(middleware::from_fn_with_state(gate, authenticate))
        .with_state(state.clone());

    // Public routes (no gate; /api/me degrades to a null user on its own)
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/{provider}", get(handlers::login_start))
        .route(
            "/api/auth/callback/{provider}",
            get(handlers::oauth_callback),
        )
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/me", get(handlers::me))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(cors)
        .layer(trace_layer)
}

/// Build the CORS layer from the configured origins.
///
/// The session cookie rides on cross-origin requests, so credentials are
/// always allowed and the origin list is explicit, never a wildcard.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let headers = [
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ORIGIN,
        header::COOKIE,
    ];

    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins()
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: invalid origin in config: {}", origin);
                None
            })
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}
