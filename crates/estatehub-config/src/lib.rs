//! # EstateHub Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: key material source (shared secret or remote key set) and token lifetime
//! - [`security`]: bearer header name/prefix and the public path list
//! - [`cors`]: allowed CORS origins
//! - [`gateway`]: upstream route table and trusted identity header policy
//! - [`server`]: bind address
//!
//! Every loader has a `from_env()` entry point and a `from_lookup()` variant
//! taking an arbitrary key lookup, so configuration can be built in tests
//! without touching the process environment.
//!
//! # Example
//!
//! ```ignore
//! use estatehub_config::{CorsConfig, JwtConfig, SecurityConfig};
//!
//! let jwt_config = JwtConfig::from_env()?;
//! let security_config = SecurityConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! ```

pub mod cors;
pub mod gateway;
pub mod jwt;
pub mod security;
pub mod server;

pub use cors::CorsConfig;
pub use gateway::{DEFAULT_USER_ID_HEADER, DEFAULT_USER_ROLES_HEADER, GatewayConfig, RouteConfig};
pub use jwt::{JwtConfig, KeySource, MAX_TOKEN_EXPIRY_SECONDS};
pub use security::SecurityConfig;
pub use server::ServerConfig;

/// Configuration that cannot be turned into a runnable process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("either JWT_SECRET or JWT_JWKS_URL must be set")]
    MissingKeySource,
    #[error("JWT_SECRET and JWT_JWKS_URL are mutually exclusive")]
    ConflictingKeySources,
    #[error("{name} has an invalid value: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Reads a comma separated list, trimming entries and dropping empty ones.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
