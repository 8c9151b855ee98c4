//! Server-side session store.
//!
//! Sessions are opaque, high-entropy tokens persisted in the backing
//! store. Validity is a pure function of `(exists, now, expires_at)`;
//! expiry is lazy — an expired row is deleted on first access past its
//! deadline, no background sweep required for correctness.

use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sqlx::PgPool;
use tracing::{debug, warn};

use super::AuthError;
use super::queries;
use crate::models::auth::{Principal, PrincipalKind, Session};

/// Session lifetime: 7 days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Generated token length (alphanumeric chars).
const TOKEN_LEN: usize = 64;

/// Tokens shorter than this are rejected without a store lookup.
pub const MIN_TOKEN_LEN: usize = 32;

/// Generate a cryptographically random opaque session token.
fn generate_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Create a session for a principal.
///
/// Expired-session garbage collection piggybacks on creation but runs
/// fire-and-forget — its failure never surfaces to the caller.
pub async fn create(pool: &PgPool, principal: &Principal) -> Result<Session, AuthError> {
    let now = Utc::now();
    let session = Session {
        token: generate_token(),
        principal_kind: match principal {
            Principal::User(_) => PrincipalKind::User,
            Principal::Operator(_) => PrincipalKind::Operator,
        },
        principal_id: principal.id().to_string(),
        created_at: now,
        expires_at: now + Duration::days(SESSION_TTL_DAYS),
    };
    queries::insert_session(pool, &session).await?;

    let gc_pool = pool.clone();
    tokio::spawn(async move {
        match queries::delete_expired_sessions(&gc_pool).await {
            Ok(0) => {}
            Ok(n) => debug!(count = n, "garbage-collected expired sessions"),
            Err(e) => warn!(error = %e, "expired-session cleanup failed"),
        }
    });

    Ok(session)
}

/// Resolve a token to its principal.
///
/// Returns `None` for absent, malformed, or expired tokens. An expired
/// session is deleted on the way out, so re-validation is idempotent.
pub async fn validate(pool: &PgPool, token: &str) -> Result<Option<Principal>, AuthError> {
    if token.len() < MIN_TOKEN_LEN {
        return Ok(None);
    }

    let Some(session) = queries::find_session(pool, token).await? else {
        debug!("session token not found");
        return Ok(None);
    };

    if !session.is_valid_at(Utc::now()) {
        debug!(expired_at = %session.expires_at, "session expired, removing");
        queries::delete_session(pool, token).await?;
        return Ok(None);
    }

    let principal = match session.principal_kind {
        PrincipalKind::User => queries::find_user_by_id(pool, &session.principal_id)
            .await?
            .map(Principal::User),
        PrincipalKind::Operator => queries::find_operator_by_id(pool, &session.principal_id)
            .await?
            .map(Principal::Operator),
    };

    // A session pointing at a deleted principal is as good as expired.
    if principal.is_none() {
        queries::delete_session(pool, token).await?;
    }
    Ok(principal)
}

/// Destroy a session. Idempotent — absence of the token is not an error.
pub async fn destroy(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    queries::delete_session(pool, token).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Session;

    #[test]
    fn generated_tokens_are_long_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.len() >= MIN_TOKEN_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn validity_is_a_pure_function_of_expiry() {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            principal_kind: PrincipalKind::User,
            principal_id: "u1".into(),
            created_at: now - Duration::days(1),
            expires_at: now + Duration::seconds(1),
        };
        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(session.expires_at));
        assert!(!session.is_valid_at(session.expires_at + Duration::seconds(1)));
    }
}
