//! API request handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::oauth::{CallbackError, Provider};
use crate::session::{Session, SessionLookup};
use crate::user::UserProfile;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Start an OAuth login by sending the browser to the provider's consent
/// page. Unknown or unconfigured providers are a plain 404.
pub async fn login_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> ApiResult<Redirect> {
    let provider: Provider = provider.parse().map_err(ApiError::NotFound)?;

    let csrf_state = Uuid::new_v4().to_string();
    let url = state
        .identity
        .authorize_url(provider, &csrf_state)
        .ok_or_else(|| ApiError::NotFound(format!("provider '{}' is not configured", provider)))?;

    info!(provider = %provider, "starting OAuth login");
    Ok(Redirect::to(&url))
}

/// Query parameters the provider sends back to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub state: Option<String>,
}

/// Finish an OAuth login: exchange the code, upsert the account, issue a
/// session and send the browser back to the application with the session
/// cookie set.
///
/// Every failure exit redirects to the login page with a machine-readable
/// `error` code; this endpoint never renders an error body.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    let user_agent = header_value(&headers, header::USER_AGENT.as_str());
    let ip = header_value(&headers, "x-forwarded-for");

    let result = match provider.parse::<Provider>() {
        Ok(parsed) => run_callback(&state, parsed, params, user_agent, ip).await,
        Err(err) => Err(CallbackError::Exchange(anyhow::anyhow!(err))),
    };

    match result {
        Ok(cookie) => (
            AppendHeaders([(SET_COOKIE, cookie)]),
            Redirect::to(&state.config.app_origin),
        )
            .into_response(),
        Err(err) => {
            warn!(provider = %provider, code = err.redirect_code(), error = %err, "login callback failed");
            let target = format!(
                "{}/login?error={}",
                state.config.app_origin,
                err.redirect_code()
            );
            Redirect::to(&target).into_response()
        }
    }
}

/// Walk the callback steps in order, stopping at the first failure.
/// Returns the `Set-Cookie` value for the issued session.
async fn run_callback(
    state: &AppState,
    provider: Provider,
    params: CallbackParams,
    user_agent: Option<String>,
    ip: Option<String>,
) -> Result<String, CallbackError> {
    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let identity = state
        .identity
        .exchange_code(provider, &code)
        .await
        .map_err(CallbackError::Exchange)?;

    if identity.email.is_empty() {
        return Err(CallbackError::IdentityRejected);
    }

    let user = state
        .users
        .upsert_from_identity(
            &identity.email,
            identity.name.as_deref(),
            identity.avatar_url.as_deref(),
        )
        .await
        .map_err(CallbackError::Completion)?;

    let issued = state
        .sessions
        .create_session(&user.id, user_agent, ip)
        .await
        .map_err(CallbackError::Completion)?;

    info!(user_id = %user.id, provider = %provider, "OAuth login completed");
    Ok(state.cookies.encode(&issued.token, issued.expires_at))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Logout response body.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Revoke the request's session and clear the cookie.
///
/// Always reports success: a missing cookie is a no-op, and a failed
/// revocation is logged while the cookie is cleared regardless.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = state.cookies.extract(&headers) {
        if let Err(err) = state.sessions.revoke_session(&token).await {
            warn!(error = ?err, "logout could not revoke the session");
        }
    }

    (
        AppendHeaders([(SET_COOKIE, state.cookies.encode_cleared())]),
        Json(LogoutResponse { ok: true }),
    )
}

/// Current-user response body.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserProfile>,
}

/// Current user, resolved from the session cookie.
///
/// Never errors toward the client: no cookie, a dead session, or a storage
/// failure all yield a null user.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<MeResponse> {
    let Some(token) = state.cookies.extract(&headers) else {
        return Json(MeResponse { user: None });
    };

    let user = match state.sessions.resolve_session(&token).await {
        SessionLookup::Authenticated(user) => Some(UserProfile::from(user)),
        SessionLookup::Unauthenticated | SessionLookup::StorageFailure => None,
    };

    Json(MeResponse { user })
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// Admin gate probe response.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub pong: bool,
}

/// Liveness probe behind the admin gate.
pub async fn admin_ping(current: CurrentUser) -> Json<PingResponse> {
    debug!(user_id = %current.user.id, "admin ping");
    Json(PingResponse { pong: true })
}

/// Query parameters for the admin session listing.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    /// Restrict the listing to one user's sessions.
    pub user_id: Option<String>,
    /// Maximum number of rows returned.
    pub limit: Option<i64>,
}

/// List sessions, newest first (admin only).
#[instrument(skip(state, _current))]
pub async fn admin_list_sessions(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<SessionListQuery>,
) -> ApiResult<Json<Vec<Session>>> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let sessions = state
        .sessions
        .list_sessions(query.user_id.as_deref(), limit)
        .await?;

    info!(count = sessions.len(), "Admin listed sessions");
    Ok(Json(sessions))
}

/// Revoke a session by token (admin only). Idempotent.
#[instrument(skip(state, _current, token))]
pub async fn admin_revoke_session(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    state.sessions.revoke_session(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
