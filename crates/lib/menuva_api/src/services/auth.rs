//! Authentication service — login/logout flows delegating to
//! `menuva_core::auth`.

use sqlx::PgPool;
use tracing::{info, warn};

use menuva_core::auth::password::{self, VerifyOutcome};
use menuva_core::auth::{queries, sessions};
use menuva_core::models::auth::{Principal, Session};

use crate::error::{AppError, AppResult};
use crate::middleware::rate_limit::LoginGuard;

/// Generic credential failure. Identical for unknown email, missing
/// hash, and wrong password, so the endpoint can't be used for account
/// enumeration.
const INVALID_CREDENTIALS: &str = "Geçersiz e-posta veya şifre";

/// Cooldown copy for a locked-out source.
const LOCKOUT_RETRY_SECS: u64 = 15 * 60;

/// Authenticate with email + password and open a session.
///
/// Tenant users are looked up first, then platform operators. Every
/// failure path records against the caller's failed-login counter; a
/// success resets it.
pub async fn login(
    pool: &PgPool,
    guard: &LoginGuard,
    source: &str,
    email: &str,
    password_input: &str,
) -> AppResult<(Principal, Session)> {
    if guard.is_locked(source) {
        warn!(source, "login attempt from locked-out source");
        return Err(AppError::RateLimited {
            retry_after_secs: LOCKOUT_RETRY_SECS,
        });
    }

    let (principal, stored_hash) = match find_principal(pool, email).await? {
        Some(found) => found,
        None => {
            guard.record_failure(source);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    let Some(stored_hash) = stored_hash else {
        guard.record_failure(source);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let outcome = password::verify_password(password_input, &stored_hash);
    if !outcome.is_valid() {
        guard.record_failure(source);
        info!(email, "failed login");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if outcome == VerifyOutcome::ValidNeedsRehash {
        upgrade_hash(pool, &principal, password_input).await;
    }

    guard.record_success(source);
    let session = sessions::create(pool, &principal).await?;
    info!(email, role = principal.role_str(), "login succeeded");
    Ok((principal, session))
}

/// Look up a principal by email: tenant users first, then operators.
async fn find_principal(
    pool: &PgPool,
    email: &str,
) -> AppResult<Option<(Principal, Option<String>)>> {
    if let Some((user, hash)) = queries::find_user_by_email(pool, email).await? {
        return Ok(Some((Principal::User(user), hash)));
    }
    if let Some((operator, hash)) = queries::find_operator_by_email(pool, email).await? {
        return Ok(Some((Principal::Operator(operator), hash)));
    }
    Ok(None)
}

/// Opportunistically upgrade a legacy hash from the just-verified
/// plaintext. A persistence failure is logged, never surfaced — the
/// login response does not depend on it.
async fn upgrade_hash(pool: &PgPool, principal: &Principal, plaintext: &str) {
    let new_hash = match password::hash_password(plaintext) {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, "legacy hash upgrade: rehash failed");
            return;
        }
    };
    let result = match principal {
        Principal::User(u) => queries::update_user_password_hash(pool, &u.id, &new_hash).await,
        Principal::Operator(o) => {
            queries::update_operator_password_hash(pool, &o.id, &new_hash).await
        }
    };
    match result {
        Ok(()) => info!(principal = %principal.email(), "upgraded legacy password hash"),
        Err(e) => warn!(error = %e, "legacy hash upgrade: persist failed"),
    }
}

/// Destroy the session behind a token, if any. Idempotent.
pub async fn logout(pool: &PgPool, token: Option<&str>) -> AppResult<()> {
    if let Some(token) = token {
        sessions::destroy(pool, token).await?;
    }
    Ok(())
}
