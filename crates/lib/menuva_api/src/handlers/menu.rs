//! Public menu rendering model.
//!
//! The one place a stale feature toggle could leak to diners: every
//! gated setting is clamped against a fresh entitlement before the
//! response is built.

use axum::Json;
use axum::extract::{Path, State};

use menuva_core::entitlement;
use menuva_core::tenants::queries;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::MenuResponse;

/// `GET /menu/{slug}` — public, no session required.
pub async fn menu_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<MenuResponse>> {
    let tenant = queries::find_tenant_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Menü bulunamadı.".into()))?;

    let ent = entitlement::resolve(&state.pool, &tenant.id).await?;
    if !ent.allowed {
        // A denied tenant's public surface degrades explicitly; stale
        // content is never rendered.
        let reason = ent
            .reason
            .unwrap_or_else(|| "Hizmet şu anda kullanılamıyor.".into());
        return Err(AppError::ServiceUnavailable(reason));
    }

    let settings = entitlement::effective_settings(&tenant, &ent);
    Ok(Json(MenuResponse {
        name: tenant.name,
        slug: tenant.slug,
        settings,
    }))
}
