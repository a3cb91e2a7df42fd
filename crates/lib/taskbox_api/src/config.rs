//! API server configuration.

use taskbox_core::auth::jwt::{DEFAULT_TOKEN_TTL_SECS, resolve_jwt_secret};

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3005").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub token_ttl_secs: i64,
}

// jwt_secret must never reach logs, so Debug is written by hand.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                     |
    /// |--------------------|---------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3005`                            |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/taskbox`         |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file     |
    /// | `TOKEN_TTL_SECS`   | `3600`                                      |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3005".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/taskbox".into()),
            jwt_secret: resolve_jwt_secret(),
            token_ttl_secs: std::env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_jwt_secret() {
        let config = ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/taskbox".into(),
            jwt_secret: "super-secret-value".into(),
            token_ttl_secs: 3600,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-value"));
    }
}
