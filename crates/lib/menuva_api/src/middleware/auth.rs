//! Session middleware — cookie extraction, session validation, and role
//! gating.
//!
//! A syntactically plausible token proves nothing: role checks require
//! the session-store round-trip, so a present-but-unresolved token is
//! treated as absent, never as pre-authorized.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use menuva_core::auth::sessions;
use menuva_core::models::auth::Principal;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::{self, TokenSource};

/// Key used to store the resolved `Principal` in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

const GENERIC_AUTH_MESSAGE: &str = "Oturum bulunamadı. Lütfen giriş yapın.";

/// Resolve the request's principal from its session cookie, or fail
/// with a generic 401.
async fn resolve_principal(
    state: &AppState,
    jar: &CookieJar,
) -> Result<(Principal, String, TokenSource), AppError> {
    let Some((token, source)) = cookies::session_token(jar) else {
        debug!("no session cookie present");
        return Err(AppError::Unauthorized(GENERIC_AUTH_MESSAGE.into()));
    };

    match sessions::validate(&state.pool, &token).await? {
        Some(principal) => Ok((principal, token, source)),
        None => {
            debug!("session token absent or expired");
            Err(AppError::Unauthorized(GENERIC_AUTH_MESSAGE.into()))
        }
    }
}

/// When the session arrived under the legacy cookie name, set the
/// canonical cookie on the way out.
fn normalize_cookie(response: &mut Response, token_source: TokenSource, token: &str, secure: bool) {
    if token_source != TokenSource::Legacy {
        return;
    }
    let cookie = cookies::session_cookie(token, secure);
    if let Ok(v) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(SET_COOKIE, v);
    }
}

/// Axum middleware: require an authenticated principal (tenant user or
/// operator) and inject it into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(request.headers());
    let (principal, token, source) = resolve_principal(&state, &jar).await?;

    request.extensions_mut().insert(CurrentPrincipal(principal));
    let mut response = next.run(request).await;
    normalize_cookie(&mut response, source, &token, state.config.production);
    Ok(response)
}

/// Axum middleware: require a platform operator.
pub async fn require_operator(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(request.headers());
    let (principal, token, source) = resolve_principal(&state, &jar).await?;

    if !principal.is_operator() {
        debug!(principal = %principal.email(), "non-operator on operator path");
        return Err(AppError::Forbidden(
            "Bu işlem için yetkiniz bulunmuyor.".into(),
        ));
    }

    request.extensions_mut().insert(CurrentPrincipal(principal));
    let mut response = next.run(request).await;
    normalize_cookie(&mut response, source, &token, state.config.production);
    Ok(response)
}
