//! Tenant settings writes.
//!
//! Every gated toggle is re-validated against a fresh entitlement at
//! write time; enabling a capability outside the current plan is a 403
//! with a display-ready reason, never a silent no-op.

use axum::extract::State;
use axum::{Extension, Json};

use menuva_core::entitlement::{self, Entitlement, features};
use menuva_core::models::auth::{Principal, UserRole};
use menuva_core::models::tenant::BASELINE_THEME;
use menuva_core::tenants::queries;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentPrincipal;
use crate::models::{SettingsResponse, SettingsUpdateRequest};

/// `PUT /api/settings` — tenant admin only.
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Extension(CurrentPrincipal(principal)): Extension<CurrentPrincipal>,
    Json(body): Json<SettingsUpdateRequest>,
) -> AppResult<Json<SettingsResponse>> {
    let Principal::User(user) = &principal else {
        return Err(AppError::Forbidden(
            "Bu işlem yalnızca işletme hesaplarıyla yapılabilir.".into(),
        ));
    };
    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Bu işlem için yönetici yetkisi gerekiyor.".into(),
        ));
    }

    let tenant = queries::find_tenant_by_id(&state.pool, &user.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("İşletme bulunamadı.".into()))?;

    let ent = entitlement::resolve(&state.pool, &tenant.id).await?;
    if !ent.allowed {
        let reason = ent
            .reason
            .clone()
            .unwrap_or_else(|| "Hesabınız şu anda işlem yapamaz.".into());
        return Err(AppError::EntitlementDenied(reason));
    }
    check_gated_toggles(&body, &ent)?;

    // Merge the request over the stored settings; unknown stored keys
    // ride along untouched.
    let mut settings = tenant.settings.clone();
    if let Some(v) = body.allow_call_waiter {
        settings.allow_call_waiter = v;
    }
    if let Some(v) = body.allow_table_orders {
        settings.allow_table_orders = v;
    }
    if let Some(v) = body.allow_takeaway_orders {
        settings.allow_takeaway_orders = v;
    }
    if let Some(v) = body.allow_delivery_orders {
        settings.allow_delivery_orders = v;
    }
    let theme = body.theme.unwrap_or_else(|| tenant.theme.clone());

    queries::update_tenant_settings(&state.pool, &tenant.id, &theme, &settings).await?;

    Ok(Json(SettingsResponse {
        theme,
        allow_call_waiter: settings.allow_call_waiter,
        allow_table_orders: settings.allow_table_orders,
        allow_takeaway_orders: settings.allow_takeaway_orders,
        allow_delivery_orders: settings.allow_delivery_orders,
    }))
}

/// Reject any attempt to *enable* a capability the current plan lacks.
/// Disabling is always allowed.
fn check_gated_toggles(body: &SettingsUpdateRequest, ent: &Entitlement) -> AppResult<()> {
    if body.allow_call_waiter == Some(true) && !ent.permits(features::WAITER_CALL) {
        return Err(AppError::EntitlementDenied(
            entitlement::feature_denied_reason(features::WAITER_CALL),
        ));
    }

    let wants_ordering = [
        body.allow_table_orders,
        body.allow_takeaway_orders,
        body.allow_delivery_orders,
    ]
    .contains(&Some(true));
    if wants_ordering && !ent.permits(features::ADVANCED_ORDERING) {
        return Err(AppError::EntitlementDenied(
            entitlement::feature_denied_reason(features::ADVANCED_ORDERING),
        ));
    }

    if let Some(theme) = &body.theme
        && theme != BASELINE_THEME
        && !ent.permits(features::PREMIUM_THEME)
    {
        return Err(AppError::EntitlementDenied(
            entitlement::feature_denied_reason(features::PREMIUM_THEME),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuva_core::entitlement::PlanLimits;

    fn entitled(names: &[&str]) -> Entitlement {
        Entitlement {
            allowed: true,
            reason: None,
            limits: PlanLimits {
                features: names.iter().map(|s| s.to_string()).collect(),
                branch_limit: 1,
                table_limit: 10,
            },
        }
    }

    #[test]
    fn enabling_ungated_toggle_passes() {
        let body = SettingsUpdateRequest {
            allow_call_waiter: Some(true),
            ..Default::default()
        };
        assert!(check_gated_toggles(&body, &entitled(&[features::WAITER_CALL])).is_ok());
    }

    #[test]
    fn enabling_gated_toggle_is_rejected_with_reason() {
        let body = SettingsUpdateRequest {
            allow_call_waiter: Some(true),
            ..Default::default()
        };
        let err = check_gated_toggles(&body, &entitled(&[])).unwrap_err();
        match err {
            AppError::EntitlementDenied(reason) => {
                assert!(reason.contains(features::WAITER_CALL));
            }
            other => panic!("expected EntitlementDenied, got {other:?}"),
        }
    }

    #[test]
    fn disabling_is_always_allowed() {
        let body = SettingsUpdateRequest {
            allow_call_waiter: Some(false),
            allow_table_orders: Some(false),
            ..Default::default()
        };
        assert!(check_gated_toggles(&body, &entitled(&[])).is_ok());
    }

    #[test]
    fn premium_theme_requires_feature_but_baseline_never_does() {
        let premium = SettingsUpdateRequest {
            theme: Some("gourmet".into()),
            ..Default::default()
        };
        assert!(check_gated_toggles(&premium, &entitled(&[])).is_err());
        assert!(check_gated_toggles(&premium, &entitled(&[features::PREMIUM_THEME])).is_ok());

        let baseline = SettingsUpdateRequest {
            theme: Some(BASELINE_THEME.into()),
            ..Default::default()
        };
        assert!(check_gated_toggles(&baseline, &entitled(&[])).is_ok());
    }
}
