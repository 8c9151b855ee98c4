//! Wire models for the gateway's HTTP surface (camelCase JSON).

use menuva_core::entitlement::EffectiveSettings;
use serde::{Deserialize, Serialize};

/// Error body returned by every failure path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub name: Option<String>,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub tenant_id: Option<String>,
}

/// Public menu render model: the tenant's stored configuration clamped
/// to its live entitlement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    pub name: String,
    pub slug: String,
    #[serde(flatten)]
    pub settings: EffectiveSettings,
}

/// Tenant settings write. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateRequest {
    pub theme: Option<String>,
    pub allow_call_waiter: Option<bool>,
    pub allow_table_orders: Option<bool>,
    pub allow_takeaway_orders: Option<bool>,
    pub allow_delivery_orders: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub theme: String,
    pub allow_call_waiter: bool,
    pub allow_table_orders: bool,
    pub allow_takeaway_orders: bool,
    pub allow_delivery_orders: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiterCallRequest {
    pub slug: String,
    pub table_no: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiterCallResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub status: String,
    pub plan_id: String,
}
