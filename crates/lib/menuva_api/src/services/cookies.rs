//! Cookie service — set/get/clear the httpOnly session cookie.
//!
//! The legacy cookie name is still read as a secondary source during
//! migration; responses always set the canonical name.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use menuva_core::auth::sessions::SESSION_TTL_DAYS;

/// Canonical session cookie name.
pub const SESSION_COOKIE: &str = "menuva_session";
/// Legacy cookie name accepted during migration.
pub const LEGACY_SESSION_COOKIE: &str = "qr_session";

/// Where a session token was found in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Canonical,
    Legacy,
}

/// Read the session token from the jar, canonical name first.
pub fn session_token(jar: &CookieJar) -> Option<(String, TokenSource)> {
    if let Some(c) = jar.get(SESSION_COOKIE) {
        return Some((c.value().to_string(), TokenSource::Canonical));
    }
    jar.get(LEGACY_SESSION_COOKIE)
        .map(|c| (c.value().to_string(), TokenSource::Legacy))
}

/// Build the httpOnly session cookie (7 days, path `/`).
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Expired cookie clearing the canonical session.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Expired cookie clearing the legacy session name.
pub fn clear_legacy_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((LEGACY_SESSION_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}
