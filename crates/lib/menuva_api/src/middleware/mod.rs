//! Gateway middleware, applied in order: security headers (response),
//! edge filter, rate limiter, then per-route session/role checks.

pub mod auth;
pub mod edge;
pub mod headers;
pub mod rate_limit;
