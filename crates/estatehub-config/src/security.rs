use std::env;

use crate::split_list;

pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/api/v1/auth/sign-in",
    "/api/v1/auth/sign-up",
    "/swagger-ui",
    "/api-docs",
    "/scalar",
    "/health",
    "/metrics",
];

/// Request authentication settings shared by the identity service and the gateway.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// Header carrying the bearer token (`JWT_HEADER`)
    pub header_name: String,
    /// Prefix stripped from the header value (`JWT_PREFIX`)
    pub header_prefix: String,
    /// Path prefixes reachable without a token (`PUBLIC_PATHS`)
    pub public_paths: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            header_name: "Authorization".to_string(),
            header_prefix: "Bearer ".to_string(),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            header_name: lookup("JWT_HEADER")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.header_name),
            // The prefix is taken verbatim so a trailing space survives.
            header_prefix: lookup("JWT_PREFIX").unwrap_or(defaults.header_prefix),
            public_paths: lookup("PUBLIC_PATHS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.public_paths),
        }
    }
}
