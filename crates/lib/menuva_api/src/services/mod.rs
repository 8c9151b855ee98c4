//! Gateway services sitting between handlers and `menuva_core`.

pub mod auth;
pub mod cookies;
