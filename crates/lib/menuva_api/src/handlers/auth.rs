//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentPrincipal;
use crate::middleware::rate_limit::ClientSource;
use crate::models::{LoginRequest, LoginResponse, LogoutResponse, MeResponse};
use crate::services::{auth, cookies};

/// `POST /api/auth/login` — authenticate with email + password, set the
/// session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    Extension(ClientSource(source)): Extension<ClientSource>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let (principal, session) = auth::login(
        &state.pool,
        &state.login_guard,
        &source,
        &body.email,
        &body.password,
    )
    .await?;

    let jar = jar
        .add(cookies::session_cookie(&session.token, state.config.production))
        .remove(cookies::clear_legacy_cookie(state.config.production));

    Ok((
        jar,
        Json(LoginResponse {
            name: principal.display_name().map(|n| n.to_string()),
            email: principal.email().to_string(),
            role: principal.role_str().to_string(),
        }),
    ))
}

/// `POST /api/auth/logout` — destroy the session, clear both cookie
/// names.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LogoutResponse>)> {
    let token = cookies::session_token(&jar).map(|(t, _)| t);
    auth::logout(&state.pool, token.as_deref()).await?;

    let jar = jar
        .add(cookies::clear_session_cookie(state.config.production))
        .add(cookies::clear_legacy_cookie(state.config.production));
    Ok((jar, Json(LogoutResponse { success: true })))
}

/// `GET /api/auth/me` — current principal summary.
pub async fn me_handler(
    Extension(CurrentPrincipal(principal)): Extension<CurrentPrincipal>,
) -> Json<MeResponse> {
    Json(MeResponse {
        name: principal.display_name().map(|n| n.to_string()),
        email: principal.email().to_string(),
        role: principal.role_str().to_string(),
        tenant_id: principal.tenant_id().map(|t| t.to_string()),
    })
}
