//! Tenant, plan, and waiter-call database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use crate::models::tenant::{SubscriptionPlan, Tenant, TenantSettings, TenantStatus};
use crate::uuid::uuidv7;

type TenantRow = (
    String,
    String,
    String,
    String,
    Option<DateTime<Utc>>,
    String,
    String,
    serde_json::Value,
);

fn tenant_from_row(row: TenantRow) -> Result<Tenant, sqlx::Error> {
    let (id, slug, name, status, trial_expires_at, plan_id, theme, settings) = row;
    let status = TenantStatus::from_db(&status).ok_or_else(|| {
        sqlx::Error::Decode(format!("unknown tenant status '{status}'").into())
    })?;
    // The settings blob is freeform at the storage boundary; unknown or
    // missing keys decode to defaults rather than failing the request.
    let settings: TenantSettings = serde_json::from_value(settings).unwrap_or_else(|e| {
        warn!(tenant_id = %id, error = %e, "undecodable tenant settings, using defaults");
        TenantSettings::default()
    });
    Ok(Tenant {
        id,
        slug,
        name,
        status,
        trial_expires_at,
        plan_id,
        theme,
        settings,
    })
}

const TENANT_COLUMNS: &str = "id::text, slug, name, status::text, trial_expires_at, \
                              plan_id::text, theme, settings";

/// Fetch a tenant by ID.
pub async fn find_tenant_by_id(
    pool: &PgPool,
    tenant_id: &str,
) -> Result<Option<Tenant>, sqlx::Error> {
    let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1::uuid");
    let row = sqlx::query_as::<_, TenantRow>(&sql)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;
    row.map(tenant_from_row).transpose()
}

/// Fetch a tenant by its public menu slug.
pub async fn find_tenant_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Tenant>, sqlx::Error> {
    let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE slug = $1");
    let row = sqlx::query_as::<_, TenantRow>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    row.map(tenant_from_row).transpose()
}

/// Fetch a subscription plan by ID.
pub async fn find_plan_by_id(
    pool: &PgPool,
    plan_id: &str,
) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, String, i64, i32, i32, Vec<String>)>(
        "SELECT id::text, code, name, price_cents, branch_limit, table_limit, features \
         FROM plans WHERE id = $1::uuid",
    )
    .bind(plan_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(id, code, name, price_cents, branch_limit, table_limit, features)| SubscriptionPlan {
            id,
            code,
            name,
            price_cents,
            branch_limit,
            table_limit,
            features: features.into_iter().collect(),
        },
    ))
}

/// Persist a tenant's settings blob and theme.
pub async fn update_tenant_settings(
    pool: &PgPool,
    tenant_id: &str,
    theme: &str,
    settings: &TenantSettings,
) -> Result<(), sqlx::Error> {
    let blob = serde_json::to_value(settings)
        .map_err(|e| sqlx::Error::Encode(format!("settings encode: {e}").into()))?;
    sqlx::query("UPDATE tenants SET theme = $2, settings = $3 WHERE id = $1::uuid")
        .bind(tenant_id)
        .bind(theme)
        .bind(blob)
        .execute(pool)
        .await?;
    Ok(())
}

/// List all tenants (operator console).
pub async fn list_tenants(pool: &PgPool) -> Result<Vec<Tenant>, sqlx::Error> {
    let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY name");
    let rows = sqlx::query_as::<_, TenantRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(tenant_from_row).collect()
}

/// Record a waiter call for a table, returning its ID.
pub async fn insert_waiter_call(
    pool: &PgPool,
    tenant_id: &str,
    table_no: i32,
) -> Result<String, sqlx::Error> {
    let id = uuidv7();
    sqlx::query("INSERT INTO waiter_calls (id, tenant_id, table_no) VALUES ($1, $2::uuid, $3)")
        .bind(id)
        .bind(tenant_id)
        .bind(table_no)
        .execute(pool)
        .await?;
    Ok(id.to_string())
}
