//! Waiter-call creation — the feature-specific public write.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use menuva_core::entitlement::{self, features};
use menuva_core::tenants::queries;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{WaiterCallRequest, WaiterCallResponse};

/// `POST /api/waiter-calls` — called from the public menu page.
///
/// The stored `allowCallWaiter` toggle alone is not enough: the tenant
/// must also currently hold the waiter-call feature, re-checked here at
/// the point of use.
pub async fn create_waiter_call_handler(
    State(state): State<AppState>,
    Json(body): Json<WaiterCallRequest>,
) -> AppResult<(StatusCode, Json<WaiterCallResponse>)> {
    let tenant = queries::find_tenant_by_slug(&state.pool, &body.slug)
        .await?
        .ok_or_else(|| AppError::NotFound("İşletme bulunamadı.".into()))?;

    let ent = entitlement::resolve(&state.pool, &tenant.id).await?;
    if !ent.permits(features::WAITER_CALL) {
        return Err(AppError::EntitlementDenied(
            entitlement::feature_denied_reason(features::WAITER_CALL),
        ));
    }
    if !tenant.settings.allow_call_waiter {
        return Err(AppError::Forbidden(
            "Garson çağrısı bu işletme için kapalı.".into(),
        ));
    }

    if body.table_no < 1 || body.table_no > ent.limits.table_limit {
        return Err(AppError::Validation("Geçersiz masa numarası.".into()));
    }

    let id = queries::insert_waiter_call(&state.pool, &tenant.id, body.table_no).await?;
    Ok((StatusCode::CREATED, Json(WaiterCallResponse { id })))
}
