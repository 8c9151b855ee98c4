//! Store-backed session tests.
//!
//! Each test runs against its own migrated database provisioned by
//! `#[sqlx::test]` from `DATABASE_URL`.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use menuva_core::auth::{queries, sessions};
use menuva_core::models::auth::{Principal, PrincipalKind, Session};
use menuva_core::uuid::uuidv7;

fn expired_session(token: &str) -> Session {
    let now = Utc::now();
    Session {
        token: token.to_string(),
        principal_kind: PrincipalKind::User,
        principal_id: uuidv7().to_string(),
        created_at: now - Duration::days(8),
        expires_at: now - Duration::days(1),
    }
}

#[sqlx::test]
async fn expired_session_is_removed_on_first_validate(pool: PgPool) {
    let session = expired_session(&"a".repeat(64));
    queries::insert_session(&pool, &session).await.unwrap();

    // First validation rejects and deletes the row.
    assert!(
        sessions::validate(&pool, &session.token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        queries::find_session(&pool, &session.token)
            .await
            .unwrap()
            .is_none()
    );

    // Re-validation of the same token is idempotent: still None, no error.
    assert!(
        sessions::validate(&pool, &session.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test]
async fn session_for_deleted_principal_is_removed(pool: PgPool) {
    // Unexpired session pointing at a user that no longer exists.
    let now = Utc::now();
    let session = Session {
        token: "b".repeat(64),
        principal_kind: PrincipalKind::User,
        principal_id: uuidv7().to_string(),
        created_at: now,
        expires_at: now + Duration::days(1),
    };
    queries::insert_session(&pool, &session).await.unwrap();

    assert!(
        sessions::validate(&pool, &session.token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        queries::find_session(&pool, &session.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test]
async fn create_validate_destroy_round_trip(pool: PgPool) {
    let plan_id: uuid::Uuid =
        sqlx::query_scalar("INSERT INTO plans (code, name) VALUES ('basic', 'Basic') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let tenant_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO tenants (slug, name, status, plan_id) \
         VALUES ('kebapci', 'Kebapçı', 'active', $1) RETURNING id",
    )
    .bind(plan_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    let user_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, role, tenant_id) \
         VALUES ('ayse@example.com', 'admin', $1) RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let user = queries::find_user_by_id(&pool, &user_id.to_string())
        .await
        .unwrap()
        .unwrap();
    let session = sessions::create(&pool, &Principal::User(user)).await.unwrap();

    match sessions::validate(&pool, &session.token).await.unwrap() {
        Some(Principal::User(u)) => {
            assert_eq!(u.email, "ayse@example.com");
            assert_eq!(u.tenant_id, tenant_id.to_string());
        }
        other => panic!("expected user principal, got {other:?}"),
    }

    sessions::destroy(&pool, &session.token).await.unwrap();
    assert!(
        sessions::validate(&pool, &session.token)
            .await
            .unwrap()
            .is_none()
    );
    // Destroy is idempotent.
    sessions::destroy(&pool, &session.token).await.unwrap();
}
