//! Tenant and plan read model.
//!
//! The gateway treats persistence as an interface; these queries are the
//! whole of it for tenants, plans, and the one feature-gated write
//! (waiter calls). Queries return plain `sqlx::Error` — callers wrap
//! into their own error domain.

pub mod queries;
