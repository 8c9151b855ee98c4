//! # menuva_api
//!
//! HTTP access gateway for Menuva. Every inbound request passes, in
//! order: security headers (response side), edge filter, rate limiter,
//! route classification (public / tenant-authenticated / operator-only),
//! session validation, role check, and — for feature-gated writes — a
//! fresh entitlement check, before any business logic runs.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health, menu, settings, waiter};
use crate::middleware::rate_limit::{LoginGuard, RateLimiter};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Injectable per-source request limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Failed-login accounting, separate from general traffic.
    pub login_guard: Arc<LoginGuard>,
}

impl AppState {
    /// Build state from a pool and config, wiring the limiter from the
    /// configured budgets.
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_general,
            config.rate_limit_sensitive,
        ));
        Self {
            pool,
            config,
            rate_limiter,
            login_guard: Arc::new(LoginGuard::new()),
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `menuva_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    menuva_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes: no session required, but still behind the edge
    // filter and rate limiter.
    let public = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/menu/{slug}", get(menu::menu_handler))
        .route("/api/waiter-calls", post(waiter::create_waiter_call_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler));

    // Tenant-authenticated routes.
    let authenticated = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/settings", put(settings::update_settings_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Operator-only routes.
    let operator = Router::new()
        .route("/api/admin/tenants", get(admin::list_tenants_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_operator,
        ));

    // Layer order is outside-in from the bottom: edge filter runs first,
    // then the rate limiter, then per-route auth.
    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(operator)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::enforce,
        ))
        .layer(axum::middleware::from_fn(middleware::edge::reject_malicious))
        .layer(axum::middleware::from_fn(middleware::headers::security_headers))
        .layer(cors)
        .with_state(state)
}
