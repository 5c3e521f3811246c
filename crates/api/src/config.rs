//! Process configuration, read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use gatekeeper_auth::MAX_TOKEN_TTL_SECS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET is not configured")]
    MissingJwtSecret,

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiConfig {
    /// In-memory configuration with defaults for everything but the secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            use_persistent_stores: false,
            database_url: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingJwtSecret)?;

        let token_ttl = match lookup("JWT_EXPIRES_IN_SECS") {
            None => Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            Some(raw) => {
                let secs = raw
                    .parse::<i64>()
                    .map_err(|e| invalid("JWT_EXPIRES_IN_SECS", &raw, e))?;
                if secs <= 0 {
                    return Err(invalid("JWT_EXPIRES_IN_SECS", &raw, "must be positive"));
                }
                if secs > MAX_TOKEN_TTL_SECS {
                    return Err(invalid(
                        "JWT_EXPIRES_IN_SECS",
                        &raw,
                        format!("must be at most {MAX_TOKEN_TTL_SECS}"),
                    ));
                }
                Duration::seconds(secs)
            }
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDR", &bind_raw, e))?;

        let use_persistent_stores = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|e| invalid("USE_PERSISTENT_STORES", &raw, e))?,
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            jwt_secret,
            token_ttl,
            bind_addr,
            use_persistent_stores,
            database_url,
        })
    }
}

fn invalid(name: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
