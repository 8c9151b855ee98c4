//! Tenant and subscription-plan domain models.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commercial status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Trial,
    Suspended,
    Expired,
}

impl TenantStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TenantStatus::Active),
            "trial" => Some(TenantStatus::Trial),
            "suspended" => Some(TenantStatus::Suspended),
            "expired" => Some(TenantStatus::Expired),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Trial => "trial",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Expired => "expired",
        }
    }
}

/// The theme every tenant can use regardless of plan.
pub const BASELINE_THEME: &str = "classic";

/// Tenant-controlled feature toggles.
///
/// This is the typed view of the `settings` JSONB column. Toggles stored
/// here may have been enabled legitimately under a *previous* plan, so
/// they are never trusted as ground truth — entitlement is re-derived at
/// the point of use. Unknown keys round-trip untouched via `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[serde(default)]
    pub allow_call_waiter: bool,
    #[serde(default)]
    pub allow_table_orders: bool,
    #[serde(default)]
    pub allow_takeaway_orders: bool,
    #[serde(default)]
    pub allow_delivery_orders: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A customer organization (a restaurant).
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub status: TenantStatus,
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub plan_id: String,
    pub theme: String,
    pub settings: TenantSettings,
}

/// Immutable subscription-plan reference data.
#[derive(Debug, Clone)]
pub struct SubscriptionPlan {
    pub id: String,
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    pub branch_limit: i32,
    pub table_limit: i32,
    /// Named capabilities. An open string set, not an enum, so plans can
    /// gain features without a code change here.
    pub features: HashSet<String>,
}
