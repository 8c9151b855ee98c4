//! Operator console handlers.

use axum::Json;
use axum::extract::State;

use menuva_core::tenants::queries;

use crate::AppState;
use crate::error::AppResult;
use crate::models::TenantSummary;

/// `GET /api/admin/tenants` — operator-only tenant listing.
pub async fn list_tenants_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TenantSummary>>> {
    let tenants = queries::list_tenants(&state.pool).await?;
    Ok(Json(
        tenants
            .into_iter()
            .map(|t| TenantSummary {
                id: t.id,
                slug: t.slug,
                name: t.name,
                status: t.status.as_db().to_uppercase(),
                plan_id: t.plan_id,
            })
            .collect(),
    ))
}
