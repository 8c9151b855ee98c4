//! Domain models.
//!
//! These are internal domain models, distinct from the API wire models
//! (which carry `#[serde(rename)]` for camelCase etc.).

pub mod auth;
pub mod tenant;
