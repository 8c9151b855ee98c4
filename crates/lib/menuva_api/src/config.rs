//! API server configuration.

/// Configuration for the gateway.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Production mode: enables `Secure` cookies and disables the
    /// local-source rate-limit exemption.
    pub production: bool,
    /// General per-source request budget per 60s window.
    pub rate_limit_general: u32,
    /// Sensitive-path (login/auth) budget per 60s window.
    pub rate_limit_sensitive: u32,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                                  |
    /// |------------------------|------------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3200`                         |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/menuva`       |
    /// | `ENV`                  | `development`                            |
    /// | `RATE_LIMIT_GENERAL`   | `120`                                    |
    /// | `RATE_LIMIT_SENSITIVE` | `10`                                     |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3200".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/menuva".into()),
            production: std::env::var("ENV").is_ok_and(|v| v == "production"),
            rate_limit_general: env_u32("RATE_LIMIT_GENERAL", 120),
            rate_limit_sensitive: env_u32("RATE_LIMIT_SENSITIVE", 10),
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
