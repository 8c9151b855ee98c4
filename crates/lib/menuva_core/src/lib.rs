//! # menuva_core
//!
//! Core domain logic for the Menuva gateway: credential verification,
//! server-side sessions, and live entitlement resolution.

pub mod auth;
pub mod entitlement;
pub mod migrate;
pub mod models;
pub mod tenants;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
