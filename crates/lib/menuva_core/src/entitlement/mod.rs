//! Live entitlement resolution.
//!
//! A tenant's stored feature toggles may date from a previous, higher
//! plan. Nothing persisted is trusted: the effective feature set is
//! re-derived from the tenant's status, trial window, and *current* plan
//! on every check. There is deliberately no caching here — a plan change
//! or trial expiry must take effect on the very next request.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use crate::models::tenant::{BASELINE_THEME, SubscriptionPlan, Tenant, TenantStatus};
use crate::tenants::queries;

/// Canonical feature names, as they appear in plan reference data.
///
/// Every call site gates on these constants; the historical synonym
/// strings scattered through older handlers resolve to one name each.
pub mod features {
    /// Waiter-call button on the public menu.
    pub const WAITER_CALL: &str = "Garson Çağrı Sistemi";
    /// Premium theme selection.
    pub const PREMIUM_THEME: &str = "Premium Tema";
    /// Table / takeaway / delivery ordering modes.
    pub const ADVANCED_ORDERING: &str = "Gelişmiş Sipariş Yönetimi";
}

/// Entitlement errors.
#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("Tenant not found")]
    TenantNotFound,

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// The limit set attached to the tenant's current plan.
#[derive(Debug, Clone, Default)]
pub struct PlanLimits {
    pub features: HashSet<String>,
    pub branch_limit: i32,
    pub table_limit: i32,
}

impl PlanLimits {
    /// Membership test on the open feature-name set.
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains(name)
    }
}

/// Derived, never persisted. Recomputed on every check.
#[derive(Debug, Clone)]
pub struct Entitlement {
    pub allowed: bool,
    /// Display-ready reason when denied.
    pub reason: Option<String>,
    pub limits: PlanLimits,
}

impl Entitlement {
    /// Is a named capability currently usable?
    pub fn permits(&self, feature: &str) -> bool {
        self.allowed && self.limits.has_feature(feature)
    }
}

/// Display-ready denial reason for a missing feature.
pub fn feature_denied_reason(feature: &str) -> String {
    format!("Bu özellik mevcut planınızda bulunmuyor: {feature}. Planınızı yükseltin.")
}

/// Evaluate the commercial state machine for a tenant against its plan.
///
/// Pure: `now` is passed in, nothing is written. A trial past its window
/// evaluates as expired without requiring a status transition in storage.
pub fn evaluate(tenant: &Tenant, plan: &SubscriptionPlan, now: DateTime<Utc>) -> Entitlement {
    let limits = PlanLimits {
        features: plan.features.clone(),
        branch_limit: plan.branch_limit,
        table_limit: plan.table_limit,
    };

    let denied = |reason: &str| Entitlement {
        allowed: false,
        reason: Some(reason.to_string()),
        limits: PlanLimits::default(),
    };

    match tenant.status {
        TenantStatus::Active => Entitlement {
            allowed: true,
            reason: None,
            limits,
        },
        TenantStatus::Trial => match tenant.trial_expires_at {
            Some(t) if now < t => Entitlement {
                allowed: true,
                reason: None,
                limits,
            },
            _ => denied("Deneme süreniz sona erdi. Devam etmek için bir plan seçin."),
        },
        TenantStatus::Suspended => {
            denied("Hesabınız askıya alınmıştır. Lütfen destek ekibiyle iletişime geçin.")
        }
        TenantStatus::Expired => denied("Aboneliğiniz sona erdi. Lütfen planınızı yenileyin."),
    }
}

/// Resolve the live entitlement for a tenant.
///
/// Loads the tenant and its plan fresh from storage on every call.
pub async fn resolve(pool: &PgPool, tenant_id: &str) -> Result<Entitlement, EntitlementError> {
    let tenant = queries::find_tenant_by_id(pool, tenant_id)
        .await?
        .ok_or(EntitlementError::TenantNotFound)?;
    let plan = queries::find_plan_by_id(pool, &tenant.plan_id)
        .await?
        .ok_or_else(|| EntitlementError::PlanNotFound(tenant.plan_id.clone()))?;
    Ok(evaluate(&tenant, &plan, Utc::now()))
}

/// The settings actually honored for one response, after clamping every
/// gated toggle against the live entitlement.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSettings {
    pub theme: String,
    pub show_call_waiter: bool,
    pub allow_table_orders: bool,
    pub allow_takeaway_orders: bool,
    pub allow_delivery_orders: bool,
}

/// Clamp a tenant's stored settings to what the entitlement allows.
///
/// Clamping is per-response only: the stored configuration is never
/// mutated, so a revoked capability reappears automatically when the
/// tenant resubscribes.
pub fn effective_settings(tenant: &Tenant, entitlement: &Entitlement) -> EffectiveSettings {
    let s = &tenant.settings;

    let theme = if tenant.theme != BASELINE_THEME && !entitlement.permits(features::PREMIUM_THEME) {
        BASELINE_THEME.to_string()
    } else {
        tenant.theme.clone()
    };

    let ordering = entitlement.permits(features::ADVANCED_ORDERING);
    EffectiveSettings {
        theme,
        show_call_waiter: s.allow_call_waiter && entitlement.permits(features::WAITER_CALL),
        allow_table_orders: s.allow_table_orders && ordering,
        allow_takeaway_orders: s.allow_takeaway_orders && ordering,
        allow_delivery_orders: s.allow_delivery_orders && ordering,
    }
}
