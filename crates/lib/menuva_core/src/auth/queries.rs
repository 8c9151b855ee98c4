//! Auth-related database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{Operator, PrincipalKind, Session, User, UserRole};

/// Fetch a tenant user by email, returning the user and its stored
/// password hash.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(User, Option<String>)>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, Option<String>, String, String, Option<String>)>(
        "SELECT id::text, email, name, role::text, tenant_id::text, password_hash \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(|(id, email, name, role, tenant_id, password_hash)| {
        let role = UserRole::from_db(&role)
            .ok_or_else(|| AuthError::Internal(format!("unknown user role '{role}'")))?;
        Ok((
            User {
                id,
                email,
                name,
                role,
                tenant_id,
            },
            password_hash,
        ))
    })
    .transpose()
}

/// Fetch a platform operator by email with its stored password hash.
pub async fn find_operator_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(Operator, Option<String>)>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
        "SELECT id::text, email, name, password_hash FROM operators WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, email, name, password_hash)| (Operator { id, email, name }, password_hash)))
}

/// Fetch a tenant user by ID.
pub async fn find_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, Option<String>, String, String)>(
        "SELECT email, name, role::text, tenant_id::text FROM users WHERE id = $1::uuid",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|(email, name, role, tenant_id)| {
        let role = UserRole::from_db(&role)
            .ok_or_else(|| AuthError::Internal(format!("unknown user role '{role}'")))?;
        Ok(User {
            id: user_id.to_string(),
            email,
            name,
            role,
            tenant_id,
        })
    })
    .transpose()
}

/// Fetch a platform operator by ID.
pub async fn find_operator_by_id(
    pool: &PgPool,
    operator_id: &str,
) -> Result<Option<Operator>, AuthError> {
    let row = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT email, name FROM operators WHERE id = $1::uuid",
    )
    .bind(operator_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(email, name)| Operator {
        id: operator_id.to_string(),
        email,
        name,
    }))
}

/// Persist an upgraded password hash for a tenant user.
pub async fn update_user_password_hash(
    pool: &PgPool,
    user_id: &str,
    password_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1::uuid")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Persist an upgraded password hash for an operator.
pub async fn update_operator_password_hash(
    pool: &PgPool,
    operator_id: &str,
    password_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE operators SET password_hash = $2 WHERE id = $1::uuid")
        .bind(operator_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert a session record keyed by its token.
pub async fn insert_session(pool: &PgPool, session: &Session) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO sessions (token, principal_kind, principal_id, created_at, expires_at) \
         VALUES ($1, $2, $3::uuid, $4, $5)",
    )
    .bind(&session.token)
    .bind(session.principal_kind.as_db())
    .bind(&session.principal_id)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Look up a session by token.
pub async fn find_session(pool: &PgPool, token: &str) -> Result<Option<Session>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, DateTime<Utc>, DateTime<Utc>)>(
        "SELECT principal_kind, principal_id::text, created_at, expires_at \
         FROM sessions WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.map(|(kind, principal_id, created_at, expires_at)| {
        let principal_kind = PrincipalKind::from_db(&kind)
            .ok_or_else(|| AuthError::Internal(format!("unknown principal kind '{kind}'")))?;
        Ok(Session {
            token: token.to_string(),
            principal_kind,
            principal_id,
            created_at,
            expires_at,
        })
    })
    .transpose()
}

/// Delete a session by token. No-op when absent.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete all expired sessions, returning the number removed.
pub async fn delete_expired_sessions(pool: &PgPool) -> Result<u64, AuthError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
